//! Projection of arbitrary serialisable values into the plain-value tree.
//!
//! [`to_param_value`] plays the role `serde_json::to_value` plays for JSON:
//! it drives a value's `Serialize` impl against an in-memory serialiser and
//! collects the result as a [`ParamValue`]. Two deliberate shape rules apply:
//!
//! - structs (nested settings objects) become [`ParamValue::Tree`], so the
//!   merge engine can hand back attribute-accessible results for them;
//! - tuples and sequences both collapse to [`ParamValue::Seq`] — positional
//!   identity is preserved, the container type is not.
//!
//! Values with no faithful plain representation (integer magnitudes beyond
//! `i64`, raw bytes) fall back to their text representation. This is lossy by
//! design; exotic attribute types will not round-trip.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{self, Serializer};

use crate::error::{ParamError, ParamResult};

use super::dot_map::DOT_MAP_TOKEN;
use super::{DotMap, ParamValue};

/// Serialises `value` into a [`ParamValue`] tree.
///
/// # Examples
///
/// ```
/// use param_store::{ParamValue, to_param_value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
///
/// let value = to_param_value(&Endpoint {
///     host: "localhost".into(),
///     port: 9000,
/// })?;
/// assert_eq!(value.get("port"), Some(&ParamValue::Int(9000)));
/// # Ok::<_, param_store::ParamError>(())
/// ```
///
/// # Errors
///
/// Returns [`ParamError::Serialize`] when the value's `Serialize` impl fails
/// or a map key cannot be rendered as text.
pub fn to_param_value<T>(value: &T) -> ParamResult<ParamValue>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = VariantSeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = VariantStructSerializer;

    fn serialize_bool(self, v: bool) -> ParamResult<ParamValue> {
        Ok(ParamValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(v))
    }

    fn serialize_i128(self, v: i128) -> ParamResult<ParamValue> {
        Ok(i64::try_from(v).map_or_else(|_| ParamValue::Str(v.to_string()), ParamValue::Int))
    }

    fn serialize_u8(self, v: u8) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> ParamResult<ParamValue> {
        Ok(ParamValue::Int(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> ParamResult<ParamValue> {
        // Text fallback for magnitudes the integer slot cannot hold.
        Ok(i64::try_from(v).map_or_else(|_| ParamValue::Str(v.to_string()), ParamValue::Int))
    }

    fn serialize_u128(self, v: u128) -> ParamResult<ParamValue> {
        Ok(i64::try_from(v).map_or_else(|_| ParamValue::Str(v.to_string()), ParamValue::Int))
    }

    fn serialize_f32(self, v: f32) -> ParamResult<ParamValue> {
        Ok(ParamValue::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> ParamResult<ParamValue> {
        Ok(ParamValue::Float(v))
    }

    fn serialize_char(self, v: char) -> ParamResult<ParamValue> {
        Ok(ParamValue::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> ParamResult<ParamValue> {
        Ok(ParamValue::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> ParamResult<ParamValue> {
        // Lossy text fallback; raw bytes have no plain-value shape.
        Ok(ParamValue::Str(String::from_utf8_lossy(v).into_owned()))
    }

    fn serialize_none(self) -> ParamResult<ParamValue> {
        Ok(ParamValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> ParamResult<ParamValue>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> ParamResult<ParamValue> {
        Ok(ParamValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ParamResult<ParamValue> {
        Ok(ParamValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ParamResult<ParamValue> {
        Ok(ParamValue::Str(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> ParamResult<ParamValue>
    where
        T: Serialize + ?Sized,
    {
        let inner = value.serialize(ValueSerializer)?;
        if name == DOT_MAP_TOKEN {
            // Re-wrap the mapping as the attribute-accessible shape.
            return Ok(match inner {
                ParamValue::Map(map) => ParamValue::Tree(DotMap::from(map)),
                other => other,
            });
        }
        Ok(inner)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> ParamResult<ParamValue>
    where
        T: Serialize + ?Sized,
    {
        let inner = value.serialize(ValueSerializer)?;
        let mut map = BTreeMap::new();
        map.insert(variant.to_owned(), inner);
        Ok(ParamValue::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> ParamResult<Self::SerializeSeq> {
        Ok(SeqSerializer {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> ParamResult<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> ParamResult<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> ParamResult<Self::SerializeTupleVariant> {
        Ok(VariantSeqSerializer {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> ParamResult<Self::SerializeMap> {
        Ok(MapSerializer {
            entries: BTreeMap::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeStruct> {
        Ok(StructSerializer {
            fields: BTreeMap::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeStructVariant> {
        Ok(VariantStructSerializer {
            variant,
            fields: BTreeMap::new(),
        })
    }
}

struct SeqSerializer {
    items: Vec<ParamValue>,
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_element<T>(&mut self, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> ParamResult<ParamValue> {
        Ok(ParamValue::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_element<T>(&mut self, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> ParamResult<ParamValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_field<T>(&mut self, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> ParamResult<ParamValue> {
        ser::SerializeSeq::end(self)
    }
}

struct VariantSeqSerializer {
    variant: &'static str,
    items: Vec<ParamValue>,
}

impl ser::SerializeTupleVariant for VariantSeqSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_field<T>(&mut self, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> ParamResult<ParamValue> {
        let mut map = BTreeMap::new();
        map.insert(self.variant.to_owned(), ParamValue::Seq(self.items));
        Ok(ParamValue::Map(map))
    }
}

struct MapSerializer {
    entries: BTreeMap<String, ParamValue>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_key<T>(&mut self, key: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        let Some(key) = self.pending_key.take() else {
            return Err(ser::Error::custom("map value serialised before its key"));
        };
        self.entries.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> ParamResult<ParamValue> {
        Ok(ParamValue::Map(self.entries))
    }
}

struct StructSerializer {
    fields: BTreeMap<String, ParamValue>,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.fields
            .insert(key.to_owned(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> ParamResult<ParamValue> {
        Ok(ParamValue::Tree(DotMap::from(self.fields)))
    }
}

struct VariantStructSerializer {
    variant: &'static str,
    fields: BTreeMap<String, ParamValue>,
}

impl ser::SerializeStructVariant for VariantStructSerializer {
    type Ok = ParamValue;
    type Error = ParamError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> ParamResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.fields
            .insert(key.to_owned(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> ParamResult<ParamValue> {
        let mut map = BTreeMap::new();
        map.insert(
            self.variant.to_owned(),
            ParamValue::Tree(DotMap::from(self.fields)),
        );
        Ok(ParamValue::Map(map))
    }
}

/// Serialiser that renders mapping keys as text, rejecting composite keys.
struct KeySerializer;

fn key_error(kind: &str) -> ParamError {
    ser::Error::custom(format!("mapping keys must be scalar, got {kind}"))
}

impl Serializer for KeySerializer {
    type Ok = String;
    type Error = ParamError;

    type SerializeSeq = ser::Impossible<String, ParamError>;
    type SerializeTuple = ser::Impossible<String, ParamError>;
    type SerializeTupleStruct = ser::Impossible<String, ParamError>;
    type SerializeTupleVariant = ser::Impossible<String, ParamError>;
    type SerializeMap = ser::Impossible<String, ParamError>;
    type SerializeStruct = ser::Impossible<String, ParamError>;
    type SerializeStructVariant = ser::Impossible<String, ParamError>;

    fn serialize_bool(self, v: bool) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_f64(self, v: f64) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> ParamResult<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> ParamResult<String> {
        Ok(v.to_owned())
    }

    fn serialize_bytes(self, _v: &[u8]) -> ParamResult<String> {
        Err(key_error("bytes"))
    }

    fn serialize_none(self) -> ParamResult<String> {
        Err(key_error("null"))
    }

    fn serialize_some<T>(self, value: &T) -> ParamResult<String>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> ParamResult<String> {
        Err(key_error("null"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ParamResult<String> {
        Err(key_error("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ParamResult<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> ParamResult<String>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> ParamResult<String>
    where
        T: Serialize + ?Sized,
    {
        Err(key_error("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> ParamResult<Self::SerializeSeq> {
        Err(key_error("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> ParamResult<Self::SerializeTuple> {
        Err(key_error("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeTupleStruct> {
        Err(key_error("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeTupleVariant> {
        Err(key_error("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> ParamResult<Self::SerializeMap> {
        Err(key_error("mapping"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeStruct> {
        Err(key_error("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ParamResult<Self::SerializeStructVariant> {
        Err(key_error("enum variant"))
    }
}
