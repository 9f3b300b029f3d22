//! The plain-value tree used for persistence and merging.
//!
//! [`ParamValue`] is the interchange representation between declared settings
//! structs, the merge engine, and the YAML document on disk. It carries one
//! extra shape beyond what YAML can express: [`ParamValue::Tree`], the
//! attribute-accessible [`DotMap`]. The distinction only exists in memory —
//! both `Map` and `Tree` render as ordinary YAML mappings — but the merge
//! engine relies on it to hand back results in the shape the default dictated.

mod de;
mod dot_map;
mod ser;

pub use de::from_param_value;
pub use dot_map::DotMap;
pub use ser::to_param_value;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value in the plain-value tree: scalar, ordered sequence, or mapping.
///
/// Values read from a document are always one of the plain shapes
/// (`Null`/`Bool`/`Int`/`Float`/`Str`/`Seq`/`Map`); `Tree` only arises from
/// serialising in-memory defaults and from merge results whose default was
/// tree-shaped.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ParamValue {
    /// Absent value (`null` in YAML).
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// Text scalar.
    Str(String),
    /// Ordered sequence of values.
    Seq(Vec<ParamValue>),
    /// Plain mapping with text keys.
    Map(BTreeMap<String, ParamValue>),
    /// Nested attribute-map (see [`DotMap`]).
    Tree(DotMap),
}

impl ParamValue {
    /// Returns `true` for [`ParamValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrows the boolean scalar, if this value is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the integer scalar, if this value is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrows the floating-point scalar, if this value is one.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrows the text scalar, if this value is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the sequence elements, if this value is a sequence.
    #[must_use]
    pub fn as_seq(&self) -> Option<&[ParamValue]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping of either shape.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        match self {
            Self::Map(map) => map.get(key),
            Self::Tree(tree) => tree.get(key),
            _ => None,
        }
    }

    /// Converts a mapping of either shape into its plain entries, consuming
    /// the value. Returns `None` for scalars and sequences.
    #[must_use]
    pub fn into_entries(self) -> Option<BTreeMap<String, ParamValue>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Tree(tree) => Some(tree.into_map()),
            _ => None,
        }
    }

    /// A short, stable name for the value's shape, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Tree(_) => "tree",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(items: Vec<ParamValue>) -> Self {
        Self::Seq(items)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParamValue {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        Self::Map(map)
    }
}

impl From<DotMap> for ParamValue {
    fn from(tree: DotMap) -> Self {
        Self::Tree(tree)
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Seq(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
            Self::Tree(tree) => serializer.collect_map(tree.iter()),
        }
    }
}

struct ParamValueVisitor;

impl<'de> Visitor<'de> for ParamValueVisitor {
    type Value = ParamValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a scalar, sequence, or mapping")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
        Ok(ParamValue::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
        Ok(ParamValue::Int(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
        // Magnitudes beyond i64 have no integer slot; keep the digits as text.
        Ok(i64::try_from(value).map_or_else(|_| ParamValue::Str(value.to_string()), ParamValue::Int))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
        Ok(ParamValue::Float(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ParamValue::Str(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
        Ok(ParamValue::Str(value))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(ParamValue::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(ParamValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(ParamValue::Seq(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
            map.insert(key, value);
        }
        Ok(ParamValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ParamValueVisitor)
    }
}
