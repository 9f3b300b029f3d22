//! Reading and writing the shared YAML document.
//!
//! One document holds the entries of every module that persists into it; the
//! store's contract is that touching one module's entry leaves every sibling
//! section's source bytes intact, comments and formatting included. Failures
//! never escape: a missing file is an empty document,
//! a parse failure is a warned-about empty document, and a failed write is a
//! warned-about no-op. Callers needing durability must verify out of band.

use std::collections::BTreeMap;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::error::{ParamError, ParamResult};
use crate::value::ParamValue;

/// The full backing file content: module name to module entry.
pub type Document = BTreeMap<String, ParamValue>;

/// Bookkeeping attribute names excluded from persistence and merging.
///
/// These are carried for compatibility with documents written by earlier
/// tooling; they are stripped from entries before save and ignored when they
/// appear in a loaded entry.
pub const INTERNAL_KEYS: [&str; 9] = [
    "ModuleName",
    "logdir",
    "fn",
    "AppName",
    "DEBUG_MODE",
    "saveParam_onlyThis_APP_NAME",
    "config_file_path",
    "params_dir",
    "pp",
];

/// Returns `true` when `key` is a bookkeeping attribute name.
#[must_use]
pub fn is_internal_key(key: &str) -> bool {
    INTERNAL_KEYS.contains(&key)
}

/// Removes bookkeeping keys from the top level of a mapping-shaped entry.
/// Scalars and sequences pass through untouched.
pub fn strip_internal_keys(entry: &mut ParamValue) {
    match entry {
        ParamValue::Map(map) => {
            map.retain(|key, _| !is_internal_key(key));
        }
        ParamValue::Tree(tree) => {
            for key in INTERNAL_KEYS {
                tree.remove(key);
            }
        }
        _ => {}
    }
}

/// Reads the document at `path`.
///
/// A missing file yields an empty document; a read or parse failure yields an
/// empty document and a warning. This function never fails.
#[must_use]
pub fn load_document(path: &Utf8Path) -> Document {
    match try_load(path) {
        Ok(document) => document,
        Err(error) => {
            warn!(path = %path, error = %error, "could not read parameter document");
            Document::new()
        }
    }
}

/// Replaces exactly the `module` entry in the document at `path`, rewriting
/// only that module's top-level section and writing the file atomically.
/// Sibling sections keep their source bytes, hand-written comments and
/// formatting included.
///
/// Bookkeeping keys are stripped from `entry` first. Write failures are
/// logged and otherwise swallowed; the caller receives no failure signal.
pub fn save_module(path: &Utf8Path, module: &str, mut entry: ParamValue) {
    strip_internal_keys(&mut entry);
    if let Err(error) = try_save(path, module, entry) {
        warn!(path = %path, module, error = %error, "could not write parameter document");
    }
}

fn try_load(path: &Utf8Path) -> ParamResult<Document> {
    if !path.exists() {
        debug!(path = %path, "parameter document absent, starting empty");
        return Ok(Document::new());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ParamError::Io {
        path: path.to_owned(),
        source,
    })?;
    // An empty or whitespace-only file parses as null rather than a mapping.
    let document: Option<Document> =
        serde_yaml::from_str(&text).map_err(|source| ParamError::Parse {
            path: path.to_owned(),
            source,
        })?;
    Ok(document.unwrap_or_default())
}

fn try_save(path: &Utf8Path, module: &str, entry: ParamValue) -> ParamResult<()> {
    let section = render_section(module, entry)?;
    let contents = match existing_text(path)? {
        Some(text) => splice_section(&text, module, &section),
        None => section,
    };
    write_text(path, &contents)
}

/// Renders one module's entry as a standalone top-level YAML section.
fn render_section(module: &str, entry: ParamValue) -> ParamResult<String> {
    let mut single = Document::new();
    single.insert(module.to_owned(), entry);
    Ok(serde_yaml::to_string(&single)?)
}

/// The current file content, provided it parses as a document. Unparseable
/// content is warned about and discarded, mirroring [`load_document`].
fn existing_text(path: &Utf8Path) -> ParamResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| ParamError::Io {
        path: path.to_owned(),
        source,
    })?;
    match serde_yaml::from_str::<Option<Document>>(&text) {
        Ok(_) => Ok(Some(text)),
        Err(error) => {
            warn!(path = %path, error = %error, "replacing unparseable parameter document");
            Ok(None)
        }
    }
}

/// Splices `section` (one module's rendered entry) into `text`, replacing the
/// module's existing top-level section or appending when it has none. Every
/// other line of `text` is carried over verbatim.
fn splice_section(text: &str, module: &str, section: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines
        .iter()
        .position(|line| is_module_key_line(line, module))
    else {
        let mut out = text.to_owned();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(section);
        return out;
    };
    let mut end = lines
        .iter()
        .skip(start + 1)
        .position(|line| is_top_level_line(line))
        .map_or(lines.len(), |offset| start + 1 + offset);
    // Blank separator lines stay with the following section.
    while end > start + 1 && lines.get(end - 1).is_some_and(|line| line.trim().is_empty()) {
        end -= 1;
    }
    let mut out = String::new();
    for line in lines.iter().take(start) {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(section);
    for line in lines.iter().skip(end) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Matches the line opening `module`'s top-level section, in the plain and
/// quoted key spellings YAML emitters produce.
fn is_module_key_line(line: &str, module: &str) -> bool {
    let plain = format!("{module}:");
    let double_quoted = format!("\"{module}\":");
    let single_quoted = format!("'{module}':");
    [plain, double_quoted, single_quoted]
        .iter()
        .any(|candidate| {
            line.strip_prefix(candidate.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
        })
}

/// A line starting a new top-level node: first column occupied by something
/// other than indentation.
fn is_top_level_line(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|first| first != ' ' && first != '\t')
}

fn write_text(path: &Utf8Path, contents: &str) -> ParamResult<()> {
    let parent = parent_dir(path);
    if parent.as_str().is_empty() {
        return write_atomic(Utf8Path::new("."), path, contents);
    }
    std::fs::create_dir_all(&parent).map_err(|source| ParamError::Io {
        path: parent.clone(),
        source,
    })?;
    write_atomic(&parent, path, contents)
}

/// Write-temp-then-rename so a concurrent reader never observes a torn file.
fn write_atomic(dir: &Utf8Path, path: &Utf8Path, contents: &str) -> ParamResult<()> {
    let io_error = |source| ParamError::Io {
        path: path.to_owned(),
        source,
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.persist(path)
        .map_err(|persist| io_error(persist.error))?;
    Ok(())
}

fn parent_dir(path: &Utf8Path) -> Utf8PathBuf {
    path.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_owned)
}
