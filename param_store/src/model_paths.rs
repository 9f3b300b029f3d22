//! Registry of model-cache directories exposed through environment variables.
//!
//! Supported providers: Hugging Face (`HF_HOME`), Ollama (`OLLAMA_MODELS`)
//! and LM Studio (`LMSTUDIO_PATH`). Session changes mutate the process
//! environment; persistent changes go to the OS permanent store (`setx` on
//! Windows, a managed `export` line in `~/.bashrc` elsewhere). This is a pure
//! side-effecting utility with no merge semantics.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

/// Provider name to the environment variable it is published under.
pub const PROVIDERS: [(&str, &str); 3] = [
    ("huggingface", "HF_HOME"),
    ("ollama", "OLLAMA_MODELS"),
    ("lmstudio", "LMSTUDIO_PATH"),
];

fn env_key(provider: &str) -> Option<&'static str> {
    PROVIDERS
        .iter()
        .find(|(name, _)| provider.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// Points `provider` at `path` for this process, and optionally in the OS
/// permanent environment store. Returns `false` for unknown providers or
/// when the persistent write fails.
#[must_use]
pub fn set_path(provider: &str, path: &Utf8Path, persistent: bool) -> bool {
    let Some(key) = env_key(provider) else {
        warn!(provider, "unknown model-path provider");
        return false;
    };
    let absolute = absolutise(path);
    // SAFETY: mutating the process environment is process-wide state; this
    // registry is documented as single-threaded setup-time configuration.
    unsafe { std::env::set_var(key, absolute.as_str()) };
    if persistent {
        return persist_path(key, &absolute);
    }
    true
}

/// The current value of the provider's variable, or empty when unset or the
/// provider is unknown.
#[must_use]
pub fn get_path(provider: &str) -> String {
    env_key(provider)
        .and_then(|key| std::env::var(key).ok())
        .unwrap_or_default()
}

/// Every provider with its current value, `"Not set"` standing in for unset
/// variables.
#[must_use]
pub fn list_all() -> BTreeMap<String, String> {
    PROVIDERS
        .iter()
        .map(|(name, key)| {
            let value = std::env::var(key).unwrap_or_else(|_| "Not set".to_owned());
            ((*name).to_owned(), value)
        })
        .collect()
}

/// Removes the provider's variable from this process. The permanent store is
/// left alone; guidance for removing it manually is logged. Returns `false`
/// for unknown providers.
#[must_use]
pub fn delete_path(provider: &str) -> bool {
    let Some(key) = env_key(provider) else {
        return false;
    };
    // SAFETY: see `set_path`.
    unsafe { std::env::remove_var(key) };
    if cfg!(windows) {
        info!(key, "to remove the persistent variable, run: REG DELETE HKCU\\Environment /V {key} /F");
    } else {
        info!(key, "remove the 'export {key}=...' line from ~/.bashrc to finish deletion");
    }
    true
}

/// Absolute, forward-slash form of `path`, so the same value is valid in
/// both shell exports and Windows registry entries.
fn absolutise(path: &Utf8Path) -> Utf8PathBuf {
    let absolute = if path.is_absolute() {
        path.to_owned()
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
            .map_or_else(|| path.to_owned(), |cwd| cwd.join(path))
    };
    Utf8PathBuf::from(absolute.as_str().replace('\\', "/"))
}

#[cfg(windows)]
fn persist_path(key: &str, path: &Utf8Path) -> bool {
    match std::process::Command::new("setx")
        .arg(key)
        .arg(path.as_str())
        .output()
    {
        Ok(output) if output.status.success() => {
            info!(key, path = %path, "persisted model path via setx");
            true
        }
        Ok(output) => {
            warn!(key, status = %output.status, "setx reported failure");
            false
        }
        Err(error) => {
            warn!(key, error = %error, "could not run setx");
            false
        }
    }
}

#[cfg(not(windows))]
fn persist_path(key: &str, path: &Utf8Path) -> bool {
    let Some(home) = dirs::home_dir() else {
        warn!(key, "no home directory, cannot persist model path");
        return false;
    };
    let bashrc = home.join(".bashrc");
    let existing = std::fs::read_to_string(&bashrc).unwrap_or_default();
    let export_prefix = format!("export {key}=");
    let mut lines: Vec<&str> = existing
        .lines()
        .filter(|line| !line.starts_with(&export_prefix))
        .collect();
    let export_line = format!("export {key}=\"{path}\"");
    lines.push(&export_line);
    let contents = lines.join("\n") + "\n";
    match std::fs::write(&bashrc, contents) {
        Ok(()) => {
            info!(key, path = %path, "persisted model path in ~/.bashrc");
            true
        }
        Err(error) => {
            warn!(key, error = %error, "could not update ~/.bashrc");
            false
        }
    }
}

#[cfg(test)]
mod tests;
