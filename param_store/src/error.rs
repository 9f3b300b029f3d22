//! Error types produced by the parameter engine.
//!
//! Public persistence operations never surface these — failures degrade to
//! logged warnings and default-valued results at the container and store
//! boundaries. Internals propagate them with `?` as usual.

use std::fmt;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias for fallible operations inside the crate.
pub type ParamResult<T> = Result<T, ParamError>;

/// Errors that can occur while serialising, merging, or persisting parameters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParamError {
    /// A value could not be projected into the plain-value tree.
    #[error("failed to serialise value: {message}")]
    Serialize {
        /// Description reported by the value's `Serialize` impl.
        message: String,
    },

    /// A plain-value tree could not be read back into the declared settings
    /// type.
    #[error("failed to deserialise value: {message}")]
    Deserialize {
        /// Description reported by the target's `Deserialize` impl.
        message: String,
    },

    /// The backing document could not be parsed as YAML.
    #[error("failed to parse document '{path}': {source}")]
    Parse {
        /// Path of the document that failed to parse.
        path: Utf8PathBuf,
        /// Underlying YAML parser error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The in-memory document could not be rendered as YAML.
    #[error("failed to render document: {0}")]
    Emit(#[from] serde_yaml::Error),

    /// Reading or writing the backing file failed.
    #[error("I/O failure on '{path}': {source}")]
    Io {
        /// Path the failed operation targeted.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl serde::ser::Error for ParamError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Serialize {
            message: msg.to_string(),
        }
    }
}

impl serde::de::Error for ParamError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Deserialize {
            message: msg.to_string(),
        }
    }
}
