//! Self-healing YAML parameter persistence.
//!
//! Application code declares its settings as an ordinary struct with
//! compiled-in defaults; a [`ParamContainer`] reconciles those defaults
//! against a human-editable YAML document shared by many modules. User edits
//! override defaults, omitted keys are repaired from the defaults, and the
//! reconciled result is written straight back — so a first run creates the
//! file and later runs backfill newly declared fields without discarding
//! user edits.
//!
//! The pieces, leaf first:
//!
//! - [`value`] — the plain-value tree ([`ParamValue`], [`DotMap`]) and the
//!   serialiser pair [`to_param_value`] / [`from_param_value`];
//! - [`merge`](merge()) — file-wins-on-leaves, default-wins-on-shape
//!   reconciliation;
//! - [`store`] — the multi-module document on disk, with atomic writes and
//!   swallow-and-warn failure semantics;
//! - [`ParamContainer`] — the user-facing load/merge/save surface;
//! - [`logger`], [`credentials`], [`model_paths`] — peripheral collaborators.

pub mod container;
pub mod credentials;
pub mod error;
pub mod logger;
pub mod merge;
pub mod model_paths;
pub mod store;
pub mod value;

pub use container::{ContainerOptions, ParamContainer};
pub use error::{ParamError, ParamResult};
pub use logger::{ParamLogger, Verbosity};
pub use merge::merge;
pub use store::{Document, load_document, save_module};
pub use value::{DotMap, ParamValue, from_param_value, to_param_value};
