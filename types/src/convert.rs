//! Conversions between plain Rust values and [`Object`]s.
//!
//! Accessor and method closures are written against ordinary Rust types; these
//! traits move values across that boundary.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{Date, Object};

#[derive(Debug, Clone, Error)]
#[error("expected {expected}, found {found}")]
pub struct ConversionError {
    pub expected: String,
    pub found: String,
}

impl ConversionError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub trait IntoObject {
    fn into_object(self) -> Object;
}

pub trait FromObject: Sized {
    fn from_object(object: Object) -> Result<Self, ConversionError>;
}

impl IntoObject for Object {
    fn into_object(self) -> Object {
        self
    }
}

impl FromObject for Object {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        Ok(object)
    }
}

impl IntoObject for () {
    fn into_object(self) -> Object {
        Object::Null
    }
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident, $name:literal;)+) => {
        $(
            impl IntoObject for $ty {
                fn into_object(self) -> Object {
                    Object::$variant(self)
                }
            }
        )+
    };
}

scalar_conversions! {
    bool => Bool, "boolean";
    char => Char, "char";
    i8 => Byte, "byte";
    i16 => Short, "short";
    i32 => Int, "int";
    i64 => Long, "long";
    f32 => Float, "float";
    f64 => Double, "double";
    i128 => BigInteger, "big integer";
    Decimal => BigDecimal, "big decimal";
    String => Text, "text";
    Uuid => Uuid, "uuid";
    Date => Date, "date";
}

impl IntoObject for &str {
    fn into_object(self) -> Object {
        Object::Text(self.to_string())
    }
}

fn mismatch(expected: &str, object: &Object) -> ConversionError {
    ConversionError::new(expected, object.kind_name())
}

impl FromObject for bool {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        object.as_bool().ok_or_else(|| mismatch("boolean", &object))
    }
}

impl FromObject for char {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Char(ch) => Ok(ch),
            Object::Text(ref text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(ch),
                    _ => Err(mismatch("char", &object)),
                }
            }
            other => Err(mismatch("char", &other)),
        }
    }
}

// Integers accept any narrower integral representation.
macro_rules! integral_from_object {
    ($($ty:ty, $name:literal => [$($variant:ident),+];)+) => {
        $(
            impl FromObject for $ty {
                fn from_object(object: Object) -> Result<Self, ConversionError> {
                    match object {
                        $(Object::$variant(value) => Ok(<$ty>::from(value)),)+
                        other => Err(mismatch($name, &other)),
                    }
                }
            }
        )+
    };
}

integral_from_object! {
    i8, "byte" => [Byte];
    i16, "short" => [Byte, Short];
    i32, "int" => [Byte, Short, Int];
    i64, "long" => [Byte, Short, Int, Long];
    i128, "big integer" => [Byte, Short, Int, Long, BigInteger];
}

impl FromObject for f32 {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Float(value) => Ok(value),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromObject for f64 {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::BigDecimal(_) => Err(mismatch("double", &object)),
            ref numeric if numeric.is_numeric() => numeric
                .as_f64()
                .ok_or_else(|| mismatch("double", &object)),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl FromObject for Decimal {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::BigDecimal(value) => Ok(value),
            ref integral @ (Object::Byte(_) | Object::Short(_) | Object::Int(_) | Object::Long(_)) => {
                integral
                    .as_i64()
                    .map(Decimal::from)
                    .ok_or_else(|| mismatch("big decimal", &object))
            }
            other => Err(mismatch("big decimal", &other)),
        }
    }
}

impl FromObject for String {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Text(text) => Ok(text),
            Object::CharArray(chars) => Ok(chars.into_iter().collect()),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromObject for Uuid {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Uuid(value) => Ok(value),
            other => Err(mismatch("uuid", &other)),
        }
    }
}

impl FromObject for Date {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Date(value) => Ok(value),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl<T: IntoObject> IntoObject for Option<T> {
    fn into_object(self) -> Object {
        self.map_or(Object::Null, IntoObject::into_object)
    }
}

impl<T: FromObject> FromObject for Option<T> {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Null => Ok(None),
            other => T::from_object(other).map(Some),
        }
    }
}

impl<T: IntoObject> IntoObject for Vec<T> {
    fn into_object(self) -> Object {
        Object::List(self.into_iter().map(IntoObject::into_object).collect())
    }
}

fn sequence_items(object: Object, expected: &str) -> Result<Vec<Object>, ConversionError> {
    match object {
        Object::List(items)
        | Object::Set(items)
        | Object::SortedSet(items)
        | Object::Array { items, .. } => Ok(items),
        other => Err(mismatch(expected, &other)),
    }
}

impl<T: FromObject> FromObject for Vec<T> {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        sequence_items(object, "list")?
            .into_iter()
            .map(T::from_object)
            .collect()
    }
}

impl<T: IntoObject> IntoObject for BTreeSet<T> {
    fn into_object(self) -> Object {
        Object::SortedSet(self.into_iter().map(IntoObject::into_object).collect())
    }
}

impl<T: FromObject + Ord> FromObject for BTreeSet<T> {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        sequence_items(object, "sorted set")?
            .into_iter()
            .map(T::from_object)
            .collect()
    }
}

impl<T: IntoObject> IntoObject for BTreeMap<String, T> {
    fn into_object(self) -> Object {
        Object::Map(
            self.into_iter()
                .map(|(key, value)| (key, value.into_object()))
                .collect(),
        )
    }
}

impl<T: FromObject> FromObject for BTreeMap<String, T> {
    fn from_object(object: Object) -> Result<Self, ConversionError> {
        match object {
            Object::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| T::from_object(value).map(|value| (key, value)))
                .collect(),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl<T: IntoObject, S> IntoObject for HashMap<String, T, S> {
    fn into_object(self) -> Object {
        Object::Map(
            self.into_iter()
                .map(|(key, value)| (key, value.into_object()))
                .collect(),
        )
    }
}
