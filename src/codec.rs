//! The sum-type wire codec.
//!
//! [`dumps`] and [`loads`] convert between [`Value`] and the engine's CBOR
//! wire representation. Encoding walks the value structurally; decoding is
//! type-directed: the wire carries only discriminant names, so the caller
//! supplies the expected [`ElementType`] and the decoder reconstructs values
//! against it, recursively for nested unions. [`ElementType::Untyped`] is the
//! explicit untyped mode, mapping wire values to the canonical built-in
//! representation without recovering any union constructor.
//!
//! Both operations are pure: no I/O, no shared mutable state beyond the
//! read-only union metadata built at declaration time, and no partial
//! mutation on failure.

use std::sync::Arc;

use ciborium::Value as CborValue;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::CodecError;
use crate::types::union::{ElementType, UnionDefinition, UnionPayload, VariantShape};
use crate::types::value::Value;

/// Encodes a value to wire bytes.
///
/// Always succeeds for values composed of primitives, built-in containers,
/// and declared union values; [`CodecError::UnsupportedValue`] is reserved
/// for values the CBOR serializer cannot represent.
pub fn dumps(value: &Value) -> Result<Vec<u8>, CodecError> {
    let wire = CborValue::from(value);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&wire, &mut buf)
        .map_err(|e| CodecError::UnsupportedValue(e.to_string()))?;
    Ok(buf)
}

/// Decodes wire bytes against an expected type.
///
/// Truncated or otherwise corrupt bytes fail with [`CodecError::Malformed`];
/// schema disagreements fail with [`CodecError::UnknownVariant`],
/// [`CodecError::ArityMismatch`] or [`CodecError::UnknownField`].
pub fn loads(bytes: &[u8], expected: &ElementType) -> Result<Value, CodecError> {
    let wire: CborValue =
        ciborium::de::from_reader(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    decode(wire, expected)
}

/// Decodes wire bytes directly into a `serde`-deserializable type.
///
/// This is the structural counterpart of [`Value::from_serialize`] for plain
/// records; it does not reconstruct declared unions.
pub fn loads_into<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}

fn kind_name(wire: &CborValue) -> &'static str {
    match wire {
        CborValue::Null => "null",
        CborValue::Bool(_) => "bool",
        CborValue::Integer(_) => "integer",
        CborValue::Float(_) => "float",
        CborValue::Text(_) => "text",
        CborValue::Bytes(_) => "bytes",
        CborValue::Array(_) => "array",
        CborValue::Map(_) => "map",
        CborValue::Tag(..) => "tag",
        _ => "unknown",
    }
}

fn mismatch(expected: &str, wire: &CborValue) -> CodecError {
    CodecError::Malformed(format!("expected {expected}, got {}", kind_name(wire)))
}

fn decode(wire: CborValue, expected: &ElementType) -> Result<Value, CodecError> {
    // Tags carry no schema information of their own; decode the content.
    if let CborValue::Tag(_, inner) = wire {
        return decode(*inner, expected);
    }

    match expected {
        ElementType::Untyped => Value::try_from(wire),
        ElementType::Bool => match wire {
            CborValue::Bool(b) => Ok(Value::Bool(b)),
            other => Err(mismatch("bool", &other)),
        },
        ElementType::Int => match wire {
            CborValue::Integer(n) => i64::try_from(n)
                .map(Value::Int)
                .map_err(|_| CodecError::Malformed("integer out of range".to_string())),
            other => Err(mismatch("integer", &other)),
        },
        ElementType::Float => match wire {
            CborValue::Float(x) => Ok(Value::Float(x)),
            // Engines may emit a float-typed field as an integer when the
            // value is whole.
            CborValue::Integer(n) => i64::try_from(n)
                .map(|n| Value::Float(n as f64))
                .map_err(|_| CodecError::Malformed("integer out of range".to_string())),
            other => Err(mismatch("float", &other)),
        },
        ElementType::Text => match wire {
            CborValue::Text(s) => Ok(Value::Text(s)),
            other => Err(mismatch("text", &other)),
        },
        ElementType::Bytes => match wire {
            CborValue::Bytes(b) => Ok(Value::Bytes(b)),
            other => Err(mismatch("bytes", &other)),
        },
        ElementType::Seq(inner) => match wire {
            CborValue::Array(items) => items
                .into_iter()
                .map(|item| decode(item, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            other => Err(mismatch("array", &other)),
        },
        ElementType::Map(inner) => match wire {
            CborValue::Map(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, val) in entries {
                    let CborValue::Text(key) = key else {
                        return Err(CodecError::Malformed("non-text map key".to_string()));
                    };
                    map.insert(key, decode(val, inner)?);
                }
                Ok(Value::Map(map))
            },
            other => Err(mismatch("map", &other)),
        },
        ElementType::Option(inner) => match wire {
            CborValue::Null => Ok(Value::Null),
            present => decode(present, inner),
        },
        ElementType::Union(def) => decode_union(wire, def),
        ElementType::Ref(reference) => {
            let def = reference.resolve()?.clone();
            decode_union(wire, &def)
        },
    }
}

/// Reconstructs a declared union value from its wire form.
///
/// The canonical forms are `{name: []}` for unit and zero-arity positional
/// variants, `{name: [..]}` for positional payloads and `{name: {..}}` for
/// named payloads. A bare text discriminant is also accepted for unit
/// variants, matching the compact marker some engine revisions emit.
fn decode_union(wire: CborValue, def: &Arc<UnionDefinition>) -> Result<Value, CodecError> {
    let (name, payload) = match wire {
        CborValue::Text(name) => (name, None),
        CborValue::Map(mut entries) => {
            if entries.len() != 1 {
                return Err(CodecError::Malformed(format!(
                    "union value must be a single-entry map, got {} entries",
                    entries.len()
                )));
            }
            let (key, payload) = entries.remove(0);
            let CborValue::Text(name) = key else {
                return Err(CodecError::Malformed(
                    "union discriminant must be text".to_string(),
                ));
            };
            (name, Some(payload))
        },
        other => return Err(mismatch("union map", &other)),
    };

    let descriptor = def
        .variant(&name)
        .ok_or_else(|| CodecError::UnknownVariant {
            union: def.name().to_string(),
            variant: name.clone(),
        })?;
    let index = descriptor.index();

    let payload = match (descriptor.shape(), payload) {
        (VariantShape::Unit, None) => UnionPayload::Unit,
        (VariantShape::Unit, Some(payload)) => match payload {
            CborValue::Array(items) if items.is_empty() => UnionPayload::Unit,
            CborValue::Array(items) => {
                return Err(CodecError::ArityMismatch {
                    variant: name,
                    expected: 0,
                    actual: items.len(),
                })
            },
            other => return Err(mismatch("empty array", &other)),
        },
        (_, None) => {
            return Err(CodecError::Malformed(format!(
                "bare discriminant for non-unit variant `{name}`"
            )))
        },
        (VariantShape::Positional(elems), Some(payload)) => {
            let items = match payload {
                CborValue::Array(items) => items,
                other => return Err(mismatch("array", &other)),
            };
            if items.len() != elems.len() {
                return Err(CodecError::ArityMismatch {
                    variant: name,
                    expected: elems.len(),
                    actual: items.len(),
                });
            }
            let fields = items
                .into_iter()
                .zip(elems)
                .map(|(item, elem)| decode(item, elem))
                .collect::<Result<Vec<_>, _>>()?;
            UnionPayload::Tuple(fields)
        },
        (VariantShape::Named(declared), Some(payload)) => {
            let entries = match payload {
                CborValue::Map(entries) => entries,
                other => return Err(mismatch("map", &other)),
            };

            // Wire order is irrelevant; collect, then rebuild in declaration
            // order.
            let mut supplied: IndexMap<String, CborValue> =
                IndexMap::with_capacity(entries.len());
            for (key, val) in entries {
                let CborValue::Text(key) = key else {
                    return Err(CodecError::Malformed("non-text field name".to_string()));
                };
                if !declared.contains_key(&key) {
                    return Err(CodecError::UnknownField {
                        variant: name,
                        field: key,
                    });
                }
                if supplied.insert(key.clone(), val).is_some() {
                    return Err(CodecError::Malformed(format!("duplicate field `{key}`")));
                }
            }
            if supplied.len() != declared.len() {
                return Err(CodecError::ArityMismatch {
                    variant: name,
                    expected: declared.len(),
                    actual: supplied.len(),
                });
            }

            let mut fields = IndexMap::with_capacity(declared.len());
            for (field, elem) in declared {
                // Present: counts match and no unknown keys were accepted.
                if let Some(val) = supplied.shift_remove(field) {
                    fields.insert(field.clone(), decode(val, elem)?);
                }
            }
            UnionPayload::Record(fields)
        },
    };

    Ok(Value::Union(def.value_from_parts(index, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitives_survive_an_untyped_round_trip() {
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::Float(2.25),
            Value::Text("brew".to_string()),
            Value::Bytes(vec![0, 1, 2]),
            Value::Seq(vec![Value::Int(1), Value::Text("a".to_string())]),
        ];
        for value in values {
            let bytes = dumps(&value).unwrap();
            assert_eq!(loads(&bytes, &ElementType::Untyped).unwrap(), value);
        }
    }

    #[test]
    fn typed_decode_rejects_the_wrong_wire_kind() {
        let bytes = dumps(&Value::Text("not a number".to_string())).unwrap();
        let err = loads(&bytes, &ElementType::Int).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn float_fields_accept_whole_wire_integers() {
        let bytes = dumps(&Value::Int(3)).unwrap();
        assert_eq!(loads(&bytes, &ElementType::Float).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn optional_fields_decode_null_and_present() {
        let expected = ElementType::option(ElementType::Int);
        let null = dumps(&Value::Null).unwrap();
        let seven = dumps(&Value::Int(7)).unwrap();
        assert_eq!(loads(&null, &expected).unwrap(), Value::Null);
        assert_eq!(loads(&seven, &expected).unwrap(), Value::Int(7));
    }

    #[test]
    fn truncated_bytes_are_malformed_not_schema_errors() {
        let mut bytes = dumps(&Value::Text("truncate me".to_string())).unwrap();
        bytes.truncate(bytes.len() - 4);
        let err = loads(&bytes, &ElementType::Untyped).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn tags_are_transparent_to_typed_decode() {
        let tagged = CborValue::Tag(42, Box::new(CborValue::Integer(5.into())));
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&tagged, &mut bytes).unwrap();
        assert_eq!(loads(&bytes, &ElementType::Int).unwrap(), Value::Int(5));
    }

    #[test]
    fn loads_into_deserializes_plain_records() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Reading {
            channel: String,
            level: f64,
        }

        let mut map = IndexMap::new();
        map.insert("channel".to_string(), Value::Text("flow".to_string()));
        map.insert("level".to_string(), Value::Float(0.5));
        let bytes = dumps(&Value::Map(map)).unwrap();

        let reading: Reading = loads_into(&bytes).unwrap();
        assert_eq!(
            reading,
            Reading {
                channel: "flow".to_string(),
                level: 0.5
            }
        );
    }
}
