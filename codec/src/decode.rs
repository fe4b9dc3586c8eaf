//! Tagged wire value to object tree.

use std::collections::BTreeMap;
use std::str::FromStr;

use courier_types::{DATE_FIELD, DATE_TYPE, Decimal, Object, TYPE_TAG, TypeRef};
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::Codec;
use crate::coerce::coerce;
use crate::date::parse_date;
use crate::error::MarshalError;

pub(crate) struct Decoder<'a> {
    codec: &'a Codec,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(codec: &'a Codec) -> Self {
        Self { codec }
    }

    pub(crate) fn decode(
        &self,
        wire: &Value,
        target: &TypeRef,
        depth: usize,
    ) -> Result<Object, MarshalError> {
        let limit = self.codec.settings().max_depth;
        if depth > limit {
            return Err(MarshalError::DepthExceeded { limit });
        }
        if wire.is_null() {
            return Ok(Object::Null);
        }

        let (decoded, target) = match wire {
            Value::Object(map) => {
                let target = self.effective_target(map, target)?;
                (self.decode_map(map, &target, depth)?, target)
            }
            Value::Array(items) => (self.decode_array(items, target, depth)?, target.clone()),
            scalar => (decode_scalar(scalar, target)?, target.clone()),
        };

        let mut result = decoded;
        for hook in self.codec.hooks().deserializers() {
            result = hook.resolve(result, wire)?;
        }
        if target.is_any() {
            Ok(result)
        } else {
            coerce(result, &target, self.codec.registry())
        }
    }

    /// The declared type refined by the wire map's type tag, if any.
    fn effective_target(
        &self,
        map: &Map<String, Value>,
        declared: &TypeRef,
    ) -> Result<TypeRef, MarshalError> {
        let Some(tag) = map.get(TYPE_TAG).and_then(Value::as_str) else {
            return Ok(declared.clone());
        };
        let registry = self.codec.registry();
        match declared {
            TypeRef::Any => registry.resolve_tag(tag),
            TypeRef::Bean(expected) => match registry.resolve_tag(tag)? {
                TypeRef::Bean(actual) if registry.is_assignable(&actual, expected) => {
                    Ok(TypeRef::Bean(actual))
                }
                _ => Err(MarshalError::TagMismatch {
                    tag: tag.to_string(),
                    expected: expected.clone(),
                }),
            },
            TypeRef::Date if tag != DATE_TYPE => Err(MarshalError::TagMismatch {
                tag: tag.to_string(),
                expected: DATE_TYPE.to_string(),
            }),
            other => Ok(other.clone()),
        }
    }

    fn decode_map(
        &self,
        map: &Map<String, Value>,
        target: &TypeRef,
        depth: usize,
    ) -> Result<Object, MarshalError> {
        match target {
            TypeRef::Date => {
                let text = map
                    .get(DATE_FIELD)
                    .and_then(Value::as_str)
                    .ok_or_else(|| MarshalError::incompatible("map", DATE_TYPE))?;
                parse_date(text)
                    .map(Object::Date)
                    .map_err(|source| MarshalError::MalformedDate {
                        value: text.to_string(),
                        source,
                    })
            }
            TypeRef::Bean(type_name) => self.decode_bean(map, type_name, depth),
            _ => {
                let mut entries = BTreeMap::new();
                for (key, value) in map {
                    if key == TYPE_TAG {
                        continue;
                    }
                    entries.insert(key.clone(), self.decode(value, &TypeRef::Any, depth + 1)?);
                }
                Ok(Object::Map(entries))
            }
        }
    }

    fn decode_bean(
        &self,
        map: &Map<String, Value>,
        type_name: &str,
        depth: usize,
    ) -> Result<Object, MarshalError> {
        let registry = self.codec.registry();
        let table = registry.properties(type_name)?;
        let mut bean = registry.construct(type_name)?;
        for (key, value) in map {
            if key == TYPE_TAG {
                continue;
            }
            let Some(property) = table.get(key).filter(|property| property.is_writeable()) else {
                continue;
            };
            if value.is_null() {
                // Fields whose Rust type cannot hold null keep their default.
                if let Err(err) = property.write(&mut *bean, Object::Null) {
                    trace!(type_name, property = %key, "Null left default in place: {err}");
                }
                continue;
            }
            let declared = property.declared_type();
            let decoded = self
                .decode(value, declared, depth + 1)
                .and_then(|decoded| coerce(decoded, declared, registry))
                .map_err(|err| err.in_property(type_name, key))?;
            property
                .write(&mut *bean, decoded)
                .map_err(|err| MarshalError::from(err).in_property(type_name, key))?;
        }
        Ok(Object::Bean(bean))
    }

    fn decode_array(
        &self,
        items: &[Value],
        target: &TypeRef,
        depth: usize,
    ) -> Result<Object, MarshalError> {
        let decode_all = |component: &TypeRef| {
            items
                .iter()
                .map(|item| self.decode(item, component, depth + 1))
                .collect::<Result<Vec<_>, _>>()
        };
        match target {
            TypeRef::Array(component) => Ok(Object::Array {
                component: (**component).clone(),
                items: decode_all(component)?,
            }),
            TypeRef::CharArray => decode_all(&TypeRef::Char)?
                .into_iter()
                .map(|item| match item {
                    Object::Char(ch) => Ok(ch),
                    other => Err(MarshalError::incompatible(other.kind_name(), TypeRef::Char)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Object::CharArray),
            _ => decode_all(&TypeRef::Any).map(Object::List),
        }
    }
}

fn decode_scalar(wire: &Value, target: &TypeRef) -> Result<Object, MarshalError> {
    Ok(match wire {
        Value::Bool(v) => Object::Bool(*v),
        Value::Number(number) => decode_number(number),
        Value::String(text) => match target {
            TypeRef::BigDecimal => Object::BigDecimal(
                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .map_err(|_| MarshalError::incompatible(format!("text {text:?}"), target))?,
            ),
            TypeRef::BigInteger => Object::BigInteger(
                text.parse()
                    .map_err(|_| MarshalError::incompatible(format!("text {text:?}"), target))?,
            ),
            _ => Object::Text(text.clone()),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => Object::Null,
    })
}

/// Integers that fit 32 bits become `Int`, then `Long`, then `BigInteger`;
/// anything with a fraction or exponent becomes `Double`.
fn decode_number(number: &Number) -> Object {
    if let Some(value) = number.as_i64() {
        i32::try_from(value).map_or(Object::Long(value), Object::Int)
    } else if let Some(value) = number.as_u64() {
        Object::BigInteger(i128::from(value))
    } else {
        Object::Double(number.as_f64().unwrap_or(f64::NAN))
    }
}
