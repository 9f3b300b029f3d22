//! The nested attribute-map shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ParamValue;

/// Marker name used to smuggle the tree shape through the serde data model.
///
/// [`DotMap`] serialises as a newtype struct carrying this name. The crate's
/// own plain-value serialiser recognises it and rebuilds a
/// [`ParamValue::Tree`]; every other serialiser (YAML included) forwards
/// newtype structs transparently and emits an ordinary mapping.
pub(crate) const DOT_MAP_TOKEN: &str = "$param_store::private::DotMap";

/// A recursive key-to-value mapping with dotted-path lookup.
///
/// This is the in-memory shape handed back by the merge engine whenever the
/// compiled-in default was itself tree-shaped, so callers can keep navigating
/// merged results the same way they navigate their defaults:
///
/// ```
/// use param_store::{DotMap, ParamValue};
///
/// let mut endpoint = DotMap::new();
/// endpoint.insert("host", ParamValue::from("127.0.0.1"));
/// let mut tree = DotMap::new();
/// tree.insert("endpoint", ParamValue::Tree(endpoint));
///
/// assert_eq!(
///     tree.dot("endpoint.host").and_then(ParamValue::as_str),
///     Some("127.0.0.1"),
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DotMap(BTreeMap<String, ParamValue>);

impl DotMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Looks up a single top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Walks a dotted path such as `"minio.access_key"` through nested
    /// mappings of either shape. Returns `None` as soon as a segment is
    /// missing or a non-mapping value is reached mid-path.
    #[must_use]
    pub fn dot(&self, path: &str) -> Option<&ParamValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.get(first)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Inserts a value, returning the previous one if the key was present.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.0.insert(key.into(), value)
    }

    /// Removes a key, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    /// Returns `true` when the key exists at the top level.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// The plain-mapping projection of this tree's top level.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, ParamValue> {
        self.0.clone()
    }

    /// Consumes the tree, yielding its top-level entries.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, ParamValue> {
        self.0
    }
}

impl From<BTreeMap<String, ParamValue>> for DotMap {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, ParamValue)> for DotMap {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DotMap {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Serialises the inner entries as a plain mapping.
struct Entries<'a>(&'a BTreeMap<String, ParamValue>);

impl Serialize for Entries<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for DotMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(DOT_MAP_TOKEN, &Entries(&self.0))
    }
}

/// Converts directly nested plain mappings into trees, so a `DotMap` read
/// from a file supports dotted access at every level, like one built in code.
/// Mappings inside sequences are left plain.
fn treeify(value: ParamValue) -> ParamValue {
    if let ParamValue::Map(map) = value {
        ParamValue::Tree(DotMap(
            map.into_iter().map(|(key, inner)| (key, treeify(inner))).collect(),
        ))
    } else {
        value
    }
}

struct DotMapVisitor;

impl<'de> Visitor<'de> for DotMapVisitor {
    type Value = DotMap;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a mapping")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
            map.insert(key, treeify(value));
        }
        Ok(DotMap(map))
    }
}

impl<'de> Deserialize<'de> for DotMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DotMapVisitor)
    }
}
