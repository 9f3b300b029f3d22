//! API-key lookup for external model providers.
//!
//! Resolution order: the provider's named environment variable, then an
//! explicit YAML key file, then the provider's default key file under the OS
//! configuration directory. When nothing matches, an empty mapping is
//! returned with a warning — callers treat credentials as optional.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ParamError, ParamResult};

/// Provider name, environment variable holding its key, and the conventional
/// key-file stem.
const PROVIDER_ENV_VARS: [(&str, &str, &str); 4] = [
    ("gemini", "API_KEY_GEMINI", "Gemini"),
    ("openai", "API_KEY_OPENAI", "OpenAI"),
    ("anthropic", "API_KEY_ANTHROPIC", "Anthropic"),
    ("deepseek", "API_KEY_DEEPSEEK", "DeepSeek"),
];

fn env_var_for(provider: &str) -> Option<&'static str> {
    PROVIDER_ENV_VARS
        .iter()
        .find(|(name, _, _)| provider.eq_ignore_ascii_case(name))
        .map(|(_, var, _)| *var)
}

fn canonical_file_stem(provider: &str) -> Option<&'static str> {
    PROVIDER_ENV_VARS
        .iter()
        .find(|(name, _, _)| provider.eq_ignore_ascii_case(name))
        .map(|(_, _, stem)| *stem)
}

/// Looks up the API key material for `provider`.
///
/// Returns `{"api_key": value}` when the provider's environment variable is
/// set; otherwise the parsed contents of `file_path` (or the provider's
/// default key file) when one exists and parses; otherwise an empty mapping
/// with a warning log. Never fails.
#[must_use]
pub fn get_api_key(provider: &str, file_path: Option<&Utf8Path>) -> BTreeMap<String, String> {
    if let Some(var) = env_var_for(provider) {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                info!(provider, "using API key from environment variable");
                return BTreeMap::from([("api_key".to_owned(), value)]);
            }
        }
    }

    let candidate = file_path
        .map(Utf8Path::to_owned)
        .or_else(|| default_key_path(provider));
    if let Some(path) = candidate {
        if path.exists() {
            match read_key_file(&path) {
                Ok(keys) => {
                    debug!(provider, path = %path, "loaded API key file");
                    return keys;
                }
                Err(error) => {
                    warn!(provider, path = %path, error = %error, "could not read API key file");
                }
            }
        }
    }

    warn!(provider, "no API key found");
    BTreeMap::new()
}

/// The provider's conventional key file under the OS configuration
/// directory, for example `~/.config/param_store/api_keys/API_Keys_Gemini.yml`.
/// Known providers resolve through their canonical spelling whatever the
/// caller's casing; unknown providers use the name as given.
#[must_use]
pub fn default_key_path(provider: &str) -> Option<Utf8PathBuf> {
    let stem = canonical_file_stem(provider).map_or_else(|| provider.to_owned(), str::to_owned);
    let config_dir = Utf8PathBuf::from_path_buf(dirs::config_dir()?).ok()?;
    Some(
        config_dir
            .join("param_store")
            .join("api_keys")
            .join(format!("API_Keys_{stem}.yml")),
    )
}

fn read_key_file(path: &Utf8Path) -> ParamResult<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|source| ParamError::Io {
        path: path.to_owned(),
        source,
    })?;
    let keys: Option<BTreeMap<String, String>> =
        serde_yaml::from_str(&text).map_err(|source| ParamError::Parse {
            path: path.to_owned(),
            source,
        })?;
    Ok(keys.unwrap_or_default())
}
