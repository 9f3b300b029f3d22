//! Level-gated diagnostic logging attached to container operations.
//!
//! Messages below the effective verbosity threshold are dropped silently.
//! Everything else is duplicated to the console (as a `tracing` event at the
//! mapped level) and appended to a date-partitioned log file. File-write
//! failures are reported only on the console — logging can never fail a
//! persistence operation.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Datelike, Local};
use tracing::warn;

/// Numeric verbosity threshold: 0 = critical only, 3 = everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Failures that abort or corrupt an operation.
    Critical,
    /// Normal operational messages.
    Info,
    /// Detail useful when diagnosing merge and persistence behaviour.
    #[default]
    Debug,
    /// Everything, including per-key merge chatter.
    Trace,
}

/// Environment variable consulted when no explicit verbosity is configured.
pub const DEBUG_MODE_VAR: &str = "DEBUG_MODE";

impl Verbosity {
    /// Maps a numeric level to a verbosity, clamping out-of-range values.
    #[must_use]
    pub const fn from_level_value(value: i64) -> Self {
        match value {
            i64::MIN..=0 => Self::Critical,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Parses the level names accepted in documents and call sites.
    /// `critical`/`error` map to 0, `warning`/`info` to 1, `debug` to 2 and
    /// `trace` to 3; unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "critical" | "error" => Some(Self::Critical),
            "warning" | "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Reads the process-wide `DEBUG_MODE` variable once, defaulting to
    /// [`Verbosity::Debug`] when unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(DEBUG_MODE_VAR)
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(Self::Debug, Self::from_level_value)
    }

    /// Upper-case label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

/// Logger bound to one module's identity and log directory.
#[derive(Clone, Debug)]
pub struct ParamLogger {
    module: String,
    log_dir: Utf8PathBuf,
    threshold: Verbosity,
}

impl ParamLogger {
    /// Creates a logger for `module` writing under `log_dir` (the current
    /// directory when empty).
    #[must_use]
    pub fn new(module: &str, log_dir: &Utf8Path, threshold: Verbosity) -> Self {
        Self {
            module: module.to_owned(),
            log_dir: log_dir.to_owned(),
            threshold,
        }
    }

    /// Rebinds the logger to a new module identity.
    pub fn set_module(&mut self, module: &str) {
        module.clone_into(&mut self.module);
    }

    /// The effective verbosity threshold.
    #[must_use]
    pub const fn threshold(&self) -> Verbosity {
        self.threshold
    }

    /// Emits `message` at `level`, or drops it silently when gated.
    pub fn log(&self, level: Verbosity, message: &str) {
        if level > self.threshold {
            return;
        }
        match level {
            Verbosity::Critical => tracing::error!(module = %self.module, "{message}"),
            Verbosity::Info => tracing::info!(module = %self.module, "{message}"),
            Verbosity::Debug => tracing::debug!(module = %self.module, "{message}"),
            Verbosity::Trace => tracing::trace!(module = %self.module, "{message}"),
        }
        let now = Local::now();
        let line = format!(
            "{} [{}] [{}] {message}",
            now.format("%m/%d, %H:%M:%S"),
            self.module,
            level.label(),
        );
        if let Err(error) = self.append_line(&line) {
            // Console only; a broken log file must not break persistence.
            warn!(module = %self.module, error = %error, "could not append to log file");
        }
    }

    /// The date-partitioned file the logger currently appends to.
    #[must_use]
    pub fn log_file_path(&self) -> Utf8PathBuf {
        let base = if self.log_dir.as_str().is_empty() {
            Utf8Path::new(".")
        } else {
            self.log_dir.as_path()
        };
        let now = Local::now();
        base.join("logs")
            .join(now.year().to_string())
            .join(now.month().to_string())
            .join(now.day().to_string())
            .join("logs.log")
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = self.log_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)?;
        writeln!(file, "{line}")
    }
}

#[cfg(test)]
mod tests;
