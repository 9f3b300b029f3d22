//! The user-facing parameter container.
//!
//! A container pairs a declared settings struct (its compiled-in defaults)
//! with the module identity, paths, and verbosity that govern persistence.
//! The settings struct *is* the schema: its serde fields are the declared
//! attributes, and unknown file keys are dropped at the typed boundary unless
//! the struct routes them into a `#[serde(flatten)]` overflow field.
//!
//! No operation here panics or returns an error — failures degrade to logged
//! warnings, leaving the attributes at their current values.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::logger::{ParamLogger, Verbosity};
use crate::merge::merge;
use crate::store;
use crate::value::{ParamValue, from_param_value, to_param_value};

/// Construction parameters for a [`ParamContainer`].
#[derive(Clone, Debug)]
pub struct ContainerOptions {
    /// Document key this container's entry is stored under.
    pub module_name: String,
    /// Base directory for the level-gated logger.
    pub log_dir: Utf8PathBuf,
    /// Per-application parameter directory; combined with `app_name` it
    /// redirects persisted files away from the literal path.
    pub params_dir: Utf8PathBuf,
    /// Application name enabling the `params_dir` redirection.
    pub app_name: String,
    /// Explicit verbosity. When `None`, the `DEBUG_MODE` environment
    /// variable is consulted once at construction.
    pub verbosity: Option<Verbosity>,
}

impl ContainerOptions {
    /// Options for `module_name` with everything else defaulted.
    #[must_use]
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }

    /// Sets the logger's base directory.
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Sets the per-application parameter directory.
    #[must_use]
    pub fn params_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.params_dir = dir.into();
        self
    }

    /// Sets the application name.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Fixes the verbosity explicitly instead of reading `DEBUG_MODE`.
    #[must_use]
    pub const fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            module_name: "main".to_owned(),
            log_dir: Utf8PathBuf::new(),
            params_dir: Utf8PathBuf::new(),
            app_name: String::new(),
            verbosity: None,
        }
    }
}

/// A declared settings struct plus its persistence bookkeeping.
///
/// The container holds exactly two states: *unsynced* (just constructed,
/// defaults only) and *synced* (a load has run). Saving alone never changes
/// the state, and there is no dirty tracking — every save re-serialises the
/// full current attribute set.
///
/// ```no_run
/// use camino::Utf8Path;
/// use param_store::{ContainerOptions, ParamContainer};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct CropSettings {
///     margin: i64,
///     labels: Vec<String>,
/// }
///
/// impl Default for CropSettings {
///     fn default() -> Self {
///         Self { margin: 8, labels: vec!["person".into()] }
///     }
/// }
///
/// let mut params = ParamContainer::with_defaults(ContainerOptions::new("crop"));
/// params.load_then_save(Utf8Path::new("app.yml"), None);
/// let settings: &CropSettings = params.params();
/// ```
#[derive(Debug)]
pub struct ParamContainer<P> {
    options: ContainerOptions,
    logger: ParamLogger,
    source_path: Option<Utf8PathBuf>,
    synced: bool,
    params: P,
}

impl<P> ParamContainer<P>
where
    P: Serialize + DeserializeOwned,
{
    /// Creates an unsynced container holding `defaults`.
    #[must_use]
    pub fn new(defaults: P, options: ContainerOptions) -> Self {
        let threshold = options.verbosity.unwrap_or_else(Verbosity::from_env);
        let logger = ParamLogger::new(&options.module_name, &options.log_dir, threshold);
        Self {
            options,
            logger,
            source_path: None,
            synced: false,
            params: defaults,
        }
    }

    /// Creates an unsynced container from the settings type's `Default`.
    #[must_use]
    pub fn with_defaults(options: ContainerOptions) -> Self
    where
        P: Default,
    {
        Self::new(P::default(), options)
    }

    /// The document key this container persists under.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.options.module_name
    }

    /// Renames the module, rebinding the logger as well.
    pub fn set_module_name(&mut self, module_name: &str) {
        module_name.clone_into(&mut self.options.module_name);
        self.logger.set_module(module_name);
    }

    /// Borrows the typed settings.
    #[must_use]
    pub const fn params(&self) -> &P {
        &self.params
    }

    /// Mutably borrows the typed settings for direct assignment.
    pub const fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    /// Returns `true` once a load has reconciled the attributes with a file.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    /// The resolved path of the last load, if any.
    #[must_use]
    pub fn source_path(&self) -> Option<&Utf8Path> {
        self.source_path.as_deref()
    }

    /// The logger attached to this container.
    #[must_use]
    pub const fn logger(&self) -> &ParamLogger {
        &self.logger
    }

    /// Reconciles the attributes against the document at `path`.
    ///
    /// The file wins for every value it specifies; defaults fill gaps and
    /// dictate the shape of merged mappings. A missing file or module entry
    /// leaves every attribute at its current value. Never fails.
    pub fn load(&mut self, path: &Utf8Path) {
        let resolved = self.resolve_path(path);
        self.source_path = Some(resolved.clone());
        let mut document = store::load_document(&resolved);
        self.synced = true;

        let Some(mut entry) = document.remove(self.module_name()) else {
            self.logger.log(
                Verbosity::Debug,
                &format!("no entry for '{}' in {resolved}, keeping defaults", self.module_name()),
            );
            return;
        };
        store::strip_internal_keys(&mut entry);

        let defaults = match to_param_value(&self.params) {
            Ok(value) => value,
            Err(error) => {
                self.logger.log(
                    Verbosity::Critical,
                    &format!("could not serialise defaults, keeping them: {error}"),
                );
                return;
            }
        };
        let merged = merge(Some(&defaults), &entry);
        match from_param_value::<P>(merged) {
            Ok(params) => {
                self.params = params;
                self.logger
                    .log(Verbosity::Debug, &format!("loaded parameters from {resolved}"));
            }
            Err(error) => {
                self.logger.log(
                    Verbosity::Critical,
                    &format!("merged entry does not fit declared fields, keeping defaults: {error}"),
                );
            }
        }
    }

    /// Serialises the current attributes into the document at `path`,
    /// leaving sibling module entries untouched. Never fails.
    pub fn save(&self, path: &Utf8Path) {
        let resolved = self.resolve_path(path);
        match to_param_value(&self.params) {
            Ok(entry) => {
                store::save_module(&resolved, self.module_name(), entry);
                self.logger
                    .log(Verbosity::Debug, &format!("saved parameters to {resolved}"));
            }
            Err(error) => {
                self.logger.log(
                    Verbosity::Critical,
                    &format!("could not serialise parameters, nothing saved: {error}"),
                );
            }
        }
    }

    /// The idiomatic self-healing entry point: load (merging file values over
    /// defaults), then save the reconciled attributes back.
    ///
    /// A first run creates the file from defaults; later runs backfill newly
    /// declared default fields into an existing file without discarding user
    /// edits. Passing `module_name` renames the module first.
    pub fn load_then_save(&mut self, path: &Utf8Path, module_name: Option<&str>) {
        if let Some(name) = module_name {
            self.set_module_name(name);
        }
        self.load(path);
        self.save(path);
    }

    /// Like [`ParamContainer::load_then_save`] with the save suppressed.
    pub fn load_only(&mut self, path: &Utf8Path, module_name: Option<&str>) {
        if let Some(name) = module_name {
            self.set_module_name(name);
        }
        self.load(path);
    }

    /// The persisted view: every declared attribute, bookkeeping excluded.
    ///
    /// Returns an empty mapping (with a critical log) when the settings type
    /// does not serialise to a mapping.
    #[must_use]
    pub fn get_params(&self) -> BTreeMap<String, ParamValue> {
        let value = match to_param_value(&self.params) {
            Ok(value) => value,
            Err(error) => {
                self.logger.log(
                    Verbosity::Critical,
                    &format!("could not serialise parameters: {error}"),
                );
                return BTreeMap::new();
            }
        };
        let Some(mut entries) = value.into_entries() else {
            self.logger.log(
                Verbosity::Critical,
                "declared settings do not serialise to a mapping",
            );
            return BTreeMap::new();
        };
        entries.retain(|key, _| !store::is_internal_key(key));
        entries
    }

    /// Looks up a top-level attribute by name, returning `fallback` when the
    /// key is unknown. Never fails.
    #[must_use]
    pub fn get(&self, key: &str, fallback: ParamValue) -> ParamValue {
        self.get_params().remove(key).unwrap_or(fallback)
    }

    /// Applies the app-name/params-dir redirection: when both are set, the
    /// file name of `path` is rehomed into the per-application directory;
    /// otherwise the path is used literally.
    fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        if self.options.app_name.is_empty() || self.options.params_dir.as_str().is_empty() {
            return path.to_owned();
        }
        let file_name = path.file_name().unwrap_or(path.as_str());
        self.options.params_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests;
