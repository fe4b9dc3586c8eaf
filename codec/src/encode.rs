//! Object tree to tagged wire value.

use std::any::Any;
use std::borrow::Cow;
use std::str::FromStr;

use courier_types::{DATE_FIELD, DATE_TYPE, Decimal, Extensions, Object, TYPE_TAG};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::Codec;
use crate::date::format_date;
use crate::error::MarshalError;
use crate::properties::PropertyDescriptor;

/// Which bean properties are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropertyPolicy {
    /// Only explicitly included properties (and the message of errors).
    #[default]
    Whitelist,
    /// Every readable property not explicitly excluded.
    Blacklist,
}

impl PropertyPolicy {
    #[must_use]
    pub fn from_whitelist(whitelist: bool) -> Self {
        if whitelist {
            PropertyPolicy::Whitelist
        } else {
            PropertyPolicy::Blacklist
        }
    }

    #[must_use]
    pub fn selects(self, property: &PropertyDescriptor) -> bool {
        match self {
            PropertyPolicy::Whitelist => {
                property.is_included() && property.is_readable() && !property.is_excluded()
            }
            PropertyPolicy::Blacklist => !property.is_excluded(),
        }
    }
}

/// Mutable state shared by every serialization hook during one top-level
/// encode call.
#[derive(Debug, Default)]
pub struct EncodeContext {
    extensions: Extensions,
}

impl EncodeContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook state of type `T`, created on first use.
    pub fn state<T: Any + Send + Default>(&mut self) -> &mut T {
        self.extensions.get_or_default::<T>()
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

pub(crate) struct Encoder<'a> {
    codec: &'a Codec,
    policy: PropertyPolicy,
    context: &'a mut EncodeContext,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(
        codec: &'a Codec,
        policy: PropertyPolicy,
        context: &'a mut EncodeContext,
    ) -> Self {
        Self {
            codec,
            policy,
            context,
        }
    }

    pub(crate) fn encode(&mut self, value: &Object, depth: usize) -> Result<Value, MarshalError> {
        let limit = self.codec.settings().max_depth;
        if depth > limit {
            return Err(MarshalError::DepthExceeded { limit });
        }
        match value {
            Object::Null => return Ok(Value::Null),
            Object::Type(name) => return Ok(Value::String(name.clone())),
            _ => {}
        }

        let mut current = Cow::Borrowed(value);
        for hook in self.codec.hooks().serializers() {
            if let Some(substitute) = hook.substitute(&current, self.context)? {
                current = Cow::Owned(substitute);
            }
        }
        self.encode_structure(&current, depth)
    }

    fn encode_structure(&mut self, value: &Object, depth: usize) -> Result<Value, MarshalError> {
        Ok(match value {
            Object::Null => Value::Null,
            Object::Bool(v) => Value::Bool(*v),
            Object::Char(v) => Value::String(v.to_string()),
            Object::Byte(v) => Value::from(*v),
            Object::Short(v) => Value::from(*v),
            Object::Int(v) => Value::from(*v),
            Object::Long(v) => Value::from(*v),
            Object::Float(v) => finite(f64::from(*v), value)?,
            Object::Double(v) => finite(*v, value)?,
            Object::BigInteger(v) => {
                if let Ok(small) = i64::try_from(*v) {
                    Value::from(small)
                } else if let Ok(unsigned) = u64::try_from(*v) {
                    Value::from(unsigned)
                } else {
                    Value::String(v.to_string())
                }
            }
            Object::BigDecimal(v) => {
                decimal_number(v).map_or_else(|| Value::String(v.to_string()), Value::Number)
            }
            Object::Text(v) => Value::String(v.clone()),
            Object::CharArray(v) => Value::String(v.iter().collect()),
            Object::Uuid(v) => Value::String(v.hyphenated().to_string()),
            Object::Enum(v) => Value::String(v.member().to_string()),
            Object::Type(name) => Value::String(name.clone()),
            Object::Date(v) => {
                let mut map = Map::new();
                map.insert(TYPE_TAG.to_string(), Value::String(DATE_TYPE.to_string()));
                map.insert(DATE_FIELD.to_string(), Value::String(format_date(v)));
                Value::Object(map)
            }
            Object::List(items)
            | Object::Set(items)
            | Object::SortedSet(items)
            | Object::Array { items, .. } => Value::Array(
                items
                    .iter()
                    .map(|item| self.encode(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            ),
            Object::Map(entries) => {
                let mut map = Map::new();
                for (key, entry) in entries {
                    map.insert(key.clone(), self.encode(entry, depth + 1)?);
                }
                Value::Object(map)
            }
            Object::Bean(bean) => {
                let codec = self.codec;
                let policy = self.policy;
                let registry = codec.registry();
                let type_name = registry
                    .type_name_of(&**bean)
                    .ok_or_else(|| MarshalError::UnregisteredType {
                        type_name: format!("{bean:?}"),
                    })?;
                let table = registry.properties(type_name)?;
                let mut map = Map::new();
                if !registry
                    .descriptor(type_name)
                    .is_some_and(|descriptor| descriptor.is_final())
                {
                    map.insert(TYPE_TAG.to_string(), Value::String(type_name.to_string()));
                }
                for property in table.values().filter(|property| policy.selects(property)) {
                    let Some(entry) = property.read(&**bean) else {
                        continue;
                    };
                    let encoded = self
                        .encode(&entry, depth + 1)
                        .map_err(|err| err.in_property(type_name, property.name()))?;
                    map.insert(property.name().to_string(), encoded);
                }
                Value::Object(map)
            }
        })
    }
}

/// The decimal as a JSON number, if a double carries it without loss.
fn decimal_number(value: &Decimal) -> Option<Number> {
    let approx = value.to_f64()?;
    let exact = approx.is_finite() && Decimal::from_str(&format!("{approx:?}")).ok() == Some(*value);
    if exact { Number::from_f64(approx) } else { None }
}

fn finite(number: f64, value: &Object) -> Result<Value, MarshalError> {
    Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| MarshalError::NumericRange {
            value: value.to_string(),
            target: "JSON number".to_string(),
        })
}
