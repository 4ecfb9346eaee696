//! The host-side runtime value model.
//!
//! [`Value`] is the canonical representation of anything the SDK can put on
//! the wire: CBOR-style primitives and containers, plus tagged union values
//! declared through [`UnionDefinition`](crate::types::UnionDefinition). All
//! encode and decode operations bottom out in this model.

use ciborium::Value as CborValue;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CodecError;
use crate::types::union::{UnionPayload, UnionValue};

/// A runtime value exchanged with the simulation bench.
///
/// Mappings preserve insertion order and use text keys, matching the engine's
/// wire representation of struct-style data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit absence, used for optional unit-typed arguments.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A text string.
    Text(String),
    /// A byte string.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    Seq(Vec<Value>),
    /// A mapping with unique text keys.
    Map(IndexMap<String, Value>),
    /// A value of a declared tagged union.
    Union(UnionValue),
}

impl Value {
    /// A short name for the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Union(_) => "union",
        }
    }

    /// Returns `true` if the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte slice if this is a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Seq`].
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the union value if this is a [`Value::Union`].
    pub fn as_union(&self) -> Option<&UnionValue> {
        match self {
            Value::Union(v) => Some(v),
            _ => None,
        }
    }

    /// Converts any `serde`-serializable value into a [`Value`].
    ///
    /// This is the bridge for plain records: a struct deriving `Serialize`
    /// maps to a wire mapping, sequences map to wire sequences, and
    /// primitives pass through unchanged. Fails with
    /// [`CodecError::UnsupportedValue`] when the value has no wire mapping,
    /// such as a map with non-text keys.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        let cbor =
            CborValue::serialized(value).map_err(|e| CodecError::UnsupportedValue(e.to_string()))?;
        Value::try_from(cbor).map_err(|e| CodecError::UnsupportedValue(e.to_string()))
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<UnionValue> for Value {
    fn from(v: UnionValue) -> Self {
        Value::Union(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Lowers a host value to its CBOR wire form.
///
/// Union values lower to a single-entry map keyed by the discriminant name:
/// an empty array payload for unit and zero-arity variants, an ordered array
/// for positional variants, and a text-keyed map for named-field variants.
impl From<&Value> for CborValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CborValue::Null,
            Value::Bool(b) => CborValue::Bool(*b),
            Value::Int(n) => CborValue::Integer((*n).into()),
            Value::Float(x) => CborValue::Float(*x),
            Value::Text(s) => CborValue::Text(s.clone()),
            Value::Bytes(b) => CborValue::Bytes(b.clone()),
            Value::Seq(items) => CborValue::Array(items.iter().map(CborValue::from).collect()),
            Value::Map(map) => CborValue::Map(
                map.iter()
                    .map(|(k, v)| (CborValue::Text(k.clone()), CborValue::from(v)))
                    .collect(),
            ),
            Value::Union(v) => {
                let payload = match v.payload() {
                    UnionPayload::Unit => CborValue::Array(Vec::new()),
                    UnionPayload::Tuple(items) => {
                        CborValue::Array(items.iter().map(CborValue::from).collect())
                    },
                    UnionPayload::Record(fields) => CborValue::Map(
                        fields
                            .iter()
                            .map(|(k, f)| (CborValue::Text(k.clone()), CborValue::from(f)))
                            .collect(),
                    ),
                };
                CborValue::Map(vec![(CborValue::Text(v.variant_name().to_string()), payload)])
            },
        }
    }
}

/// Lifts a CBOR wire value to the canonical built-in representation.
///
/// This is the untyped structural mapping: no attempt is made to recover a
/// union constructor. Tagged values are unwrapped to their content.
impl TryFrom<CborValue> for Value {
    type Error = CodecError;

    fn try_from(wire: CborValue) -> Result<Self, CodecError> {
        match wire {
            CborValue::Null => Ok(Value::Null),
            CborValue::Bool(b) => Ok(Value::Bool(b)),
            CborValue::Integer(n) => i64::try_from(n)
                .map(Value::Int)
                .map_err(|_| CodecError::Malformed("integer out of range".to_string())),
            CborValue::Float(x) => Ok(Value::Float(x)),
            CborValue::Text(s) => Ok(Value::Text(s)),
            CborValue::Bytes(b) => Ok(Value::Bytes(b)),
            CborValue::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            CborValue::Map(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, val) in entries {
                    let CborValue::Text(key) = key else {
                        return Err(CodecError::Malformed("non-text map key".to_string()));
                    };
                    map.insert(key, Value::try_from(val)?);
                }
                Ok(Value::Map(map))
            },
            CborValue::Tag(_, inner) => Value::try_from(*inner),
            other => Err(CodecError::Malformed(format!(
                "unsupported wire value: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_impls_cover_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("hi"), Value::Text("hi".to_string()));
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn from_serialize_maps_plain_records() {
        #[derive(Serialize)]
        struct Reading {
            channel: String,
            level: f64,
        }

        let value = Value::from_serialize(&Reading {
            channel: "flow_rate".to_string(),
            level: 4.5e-6,
        })
        .unwrap();

        let map = value.as_map().unwrap();
        assert_eq!(map["channel"], Value::Text("flow_rate".to_string()));
        assert_eq!(map["level"], Value::Float(4.5e-6));
    }

    #[test]
    fn from_serialize_rejects_non_text_map_keys() {
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(1u32, "one");

        let err = Value::from_serialize(&map).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedValue(_)));
    }

    #[test]
    fn untyped_lift_rejects_out_of_range_integers() {
        let wire = CborValue::Integer(u64::MAX.into());
        let err = Value::try_from(wire).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }
}
