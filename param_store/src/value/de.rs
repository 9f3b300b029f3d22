//! Reading plain-value trees back into typed settings structs.
//!
//! [`from_param_value`] mirrors `serde_json::from_value`: a [`ParamValue`]
//! acts as a self-describing `Deserializer`, so merge results can be written
//! back onto the declared fields of a settings struct. `Tree` and `Map` both
//! present as mappings — the shape distinction matters to the merge engine,
//! not to `Deserialize` impls.

use std::collections::btree_map;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::error::{ParamError, ParamResult};

use super::ParamValue;

/// Deserialises a [`ParamValue`] tree into any `Deserialize` type.
///
/// # Examples
///
/// ```
/// use param_store::{from_param_value, to_param_value};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
///
/// let original = Endpoint { host: "localhost".into(), port: 9000 };
/// let tree = to_param_value(&original)?;
/// let restored: Endpoint = from_param_value(tree)?;
/// assert_eq!(restored, original);
/// # Ok::<_, param_store::ParamError>(())
/// ```
///
/// # Errors
///
/// Returns [`ParamError::Deserialize`] when the tree does not match the
/// target type's shape.
pub fn from_param_value<T>(value: ParamValue) -> ParamResult<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

impl ParamValue {
    fn invalid_type(&self, expected: &dyn de::Expected) -> ParamError {
        de::Error::invalid_type(self.unexpected(), expected)
    }

    fn unexpected(&self) -> de::Unexpected<'_> {
        match self {
            Self::Null => de::Unexpected::Unit,
            Self::Bool(b) => de::Unexpected::Bool(*b),
            Self::Int(i) => de::Unexpected::Signed(*i),
            Self::Float(f) => de::Unexpected::Float(*f),
            Self::Str(s) => de::Unexpected::Str(s),
            Self::Seq(_) => de::Unexpected::Seq,
            Self::Map(_) | Self::Tree(_) => de::Unexpected::Map,
        }
    }
}

impl<'de> de::Deserializer<'de> for ParamValue {
    type Error = ParamError;

    fn deserialize_any<V>(self, visitor: V) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Self::Null => visitor.visit_unit(),
            Self::Bool(b) => visitor.visit_bool(b),
            Self::Int(i) => visitor.visit_i64(i),
            Self::Float(f) => visitor.visit_f64(f),
            Self::Str(s) => visitor.visit_string(s),
            Self::Seq(items) => visit_seq(items, visitor),
            Self::Map(map) => visit_entries(map, visitor),
            Self::Tree(tree) => visit_entries(tree.into_map(), visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Self::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Self::Str(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            mapping @ (Self::Map(_) | Self::Tree(_)) => {
                let entries = mapping
                    .into_entries()
                    .unwrap_or_default();
                let mut iter = entries.into_iter();
                let Some((variant, value)) = iter.next() else {
                    return Err(de::Error::custom(
                        "expected a mapping with a single variant key",
                    ));
                };
                if iter.next().is_some() {
                    return Err(de::Error::custom(
                        "expected a mapping with a single variant key",
                    ));
                }
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(other.invalid_type(&"an enum variant")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, ParamError> for ParamValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

fn visit_seq<'de, V>(items: Vec<ParamValue>, visitor: V) -> ParamResult<V::Value>
where
    V: Visitor<'de>,
{
    let mut access = SeqDeserializer {
        iter: items.into_iter(),
    };
    visitor.visit_seq(&mut access)
}

fn visit_entries<'de, V>(
    entries: std::collections::BTreeMap<String, ParamValue>,
    visitor: V,
) -> ParamResult<V::Value>
where
    V: Visitor<'de>,
{
    let mut access = MapDeserializer {
        iter: entries.into_iter(),
        pending_value: None,
    };
    visitor.visit_map(&mut access)
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<ParamValue>,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = ParamError;

    fn next_element_seed<T>(&mut self, seed: T) -> ParamResult<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        self.iter
            .next()
            .map(|value| seed.deserialize(value))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: btree_map::IntoIter<String, ParamValue>,
    pending_value: Option<ParamValue>,
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = ParamError;

    fn next_key_seed<K>(&mut self, seed: K) -> ParamResult<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending_value = Some(value);
                seed.deserialize(ParamValue::Str(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> ParamResult<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending_value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<ParamValue>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = ParamError;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> ParamResult<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ParamValue::Str(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<ParamValue>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = ParamError;

    fn unit_variant(self) -> ParamResult<()> {
        match self.value {
            None | Some(ParamValue::Null) => Ok(()),
            Some(other) => Err(other.invalid_type(&"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> ParamResult<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.value.unwrap_or(ParamValue::Null))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(ParamValue::Seq(items)) => visit_seq(items, visitor),
            Some(other) => Err(other.invalid_type(&"tuple variant")),
            None => Err(de::Error::custom("expected tuple variant payload")),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> ParamResult<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(mapping @ (ParamValue::Map(_) | ParamValue::Tree(_))) => {
                visit_entries(mapping.into_entries().unwrap_or_default(), visitor)
            }
            Some(other) => Err(other.invalid_type(&"struct variant")),
            None => Err(de::Error::custom("expected struct variant payload")),
        }
    }
}
