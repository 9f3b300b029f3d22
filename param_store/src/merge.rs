//! Reconciliation of compiled-in defaults against file-sourced overrides.
//!
//! The rules, evaluated on the file value's shape:
//!
//! 1. **Mapping** — the file's keys win recursively; keys present only in the
//!    default are retained, so old documents gain newly added default fields
//!    on the next load (the self-healing behaviour). The *result shape*
//!    follows the default: a tree-shaped default yields a tree, anything else
//!    yields a plain mapping. Serialised settings structs arrive here already
//!    tree-shaped, so merged nested objects stay attribute-accessible.
//! 2. **Sequence** — replaced wholesale. Sequences are never merged
//!    element-by-element, whatever the default held.
//! 3. **Scalar / null** — the file leaf wins outright.
//!
//! One asymmetry is kept deliberately: when the default is absent and the
//! file supplies a mapping, the result is a plain mapping rather than a tree.

use std::collections::BTreeMap;

use crate::value::{DotMap, ParamValue};

/// Shape the merged mapping is rewrapped into, dictated by the default.
enum MappingShape {
    Plain,
    Tree,
}

/// Merges a file-sourced value over a compiled-in default.
///
/// The file is authoritative for every value it specifies; the default fills
/// gaps and dictates the structural shape of merged mappings.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use param_store::{merge, ParamValue};
///
/// let default = ParamValue::Map(BTreeMap::from([
///     ("host".to_owned(), ParamValue::from("localhost")),
///     ("port".to_owned(), ParamValue::Int(9000)),
/// ]));
/// let from_file = ParamValue::Map(BTreeMap::from([
///     ("port".to_owned(), ParamValue::Int(9090)),
/// ]));
///
/// let merged = merge(Some(&default), &from_file);
/// assert_eq!(merged.get("port"), Some(&ParamValue::Int(9090)));
/// assert_eq!(merged.get("host"), Some(&ParamValue::from("localhost")));
/// ```
#[must_use]
pub fn merge(default: Option<&ParamValue>, from_file: &ParamValue) -> ParamValue {
    match from_file {
        ParamValue::Map(overrides) => merge_mapping(default, overrides),
        // File trees never occur in practice (documents parse to plain
        // mappings); normalise and fall through for completeness.
        ParamValue::Tree(tree) => merge(default, &ParamValue::Map(tree.to_map())),
        ParamValue::Seq(items) => ParamValue::Seq(items.clone()),
        leaf => leaf.clone(),
    }
}

fn merge_mapping(
    default: Option<&ParamValue>,
    overrides: &BTreeMap<String, ParamValue>,
) -> ParamValue {
    let (mut base, shape) = match default {
        Some(ParamValue::Map(map)) => (map.clone(), MappingShape::Plain),
        Some(ParamValue::Tree(tree)) => (tree.to_map(), MappingShape::Tree),
        // Absent, scalar, or sequence defaults contribute nothing and the
        // result stays a plain mapping.
        _ => (BTreeMap::new(), MappingShape::Plain),
    };

    for (key, incoming) in overrides {
        let merged = merge(base.get(key), incoming);
        base.insert(key.clone(), merged);
    }

    match shape {
        MappingShape::Plain => ParamValue::Map(base),
        MappingShape::Tree => ParamValue::Tree(DotMap::from(base)),
    }
}

#[cfg(test)]
mod tests;
