//! Declared types.

use std::fmt;

use crate::{DATE_TYPE, Object};

/// The declared type a value is decoded or coerced against.
///
/// `Any` stands for an unknown or generic target: decoding falls back to the
/// type tag on the wire, then to untyped values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeRef {
    #[default]
    Any,
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Text,
    CharArray,
    Uuid,
    Date,
    Type,
    Enum(String),
    List,
    Set,
    SortedSet,
    Array(Box<TypeRef>),
    Map,
    Bean(String),
}

impl TypeRef {
    pub fn bean(name: impl Into<String>) -> Self {
        TypeRef::Bean(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeRef::Enum(name.into())
    }

    #[must_use]
    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, TypeRef::Any)
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeRef::Byte
                | TypeRef::Short
                | TypeRef::Int
                | TypeRef::Long
                | TypeRef::Float
                | TypeRef::Double
                | TypeRef::BigInteger
                | TypeRef::BigDecimal
        )
    }

    /// Whether `value` already has the runtime shape of this type.
    ///
    /// Beans match any bean type here; subtype checks need the type registry.
    #[must_use]
    pub fn matches_shape(&self, value: &Object) -> bool {
        match (self, value) {
            (_, Object::Null) | (TypeRef::Any, _) => true,
            (TypeRef::Bool, Object::Bool(_))
            | (TypeRef::Char, Object::Char(_))
            | (TypeRef::Byte, Object::Byte(_))
            | (TypeRef::Short, Object::Short(_))
            | (TypeRef::Int, Object::Int(_))
            | (TypeRef::Long, Object::Long(_))
            | (TypeRef::Float, Object::Float(_))
            | (TypeRef::Double, Object::Double(_))
            | (TypeRef::BigInteger, Object::BigInteger(_))
            | (TypeRef::BigDecimal, Object::BigDecimal(_))
            | (TypeRef::Text, Object::Text(_))
            | (TypeRef::CharArray, Object::CharArray(_))
            | (TypeRef::Uuid, Object::Uuid(_))
            | (TypeRef::Date, Object::Date(_))
            | (TypeRef::Type, Object::Type(_))
            | (TypeRef::List, Object::List(_))
            | (TypeRef::Set, Object::Set(_) | Object::SortedSet(_))
            | (TypeRef::SortedSet, Object::SortedSet(_))
            | (TypeRef::Map, Object::Map(_))
            | (TypeRef::Bean(_), Object::Bean(_)) => true,
            (TypeRef::Enum(name), Object::Enum(value)) => value.type_name() == name,
            (TypeRef::Array(component), Object::Array { component: actual, .. }) => {
                **component == *actual
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("any"),
            TypeRef::Bool => f.write_str("boolean"),
            TypeRef::Char => f.write_str("char"),
            TypeRef::Byte => f.write_str("byte"),
            TypeRef::Short => f.write_str("short"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Long => f.write_str("long"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Double => f.write_str("double"),
            TypeRef::BigInteger => f.write_str("big integer"),
            TypeRef::BigDecimal => f.write_str("big decimal"),
            TypeRef::Text => f.write_str("text"),
            TypeRef::CharArray => f.write_str("char[]"),
            TypeRef::Uuid => f.write_str("uuid"),
            TypeRef::Date => f.write_str(DATE_TYPE),
            TypeRef::Type => f.write_str("type"),
            TypeRef::List => f.write_str("list"),
            TypeRef::Set => f.write_str("set"),
            TypeRef::SortedSet => f.write_str("sorted set"),
            TypeRef::Map => f.write_str("map"),
            TypeRef::Array(component) => write!(f, "{component}[]"),
            TypeRef::Enum(name) | TypeRef::Bean(name) => f.write_str(name),
        }
    }
}
