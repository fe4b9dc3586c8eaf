//! The runtime object tree.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::{ConversionError, Date, TypeRef};

/// A value that can travel as a plain object ("bean").
///
/// Implemented for every `Clone + PartialEq + Debug` type that is `Send + Sync`,
/// so domain structs only need the usual derives plus a registration.
pub trait Remotable: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_remotable(&self) -> Box<dyn Remotable>;
    fn eq_remotable(&self, other: &dyn Remotable) -> bool;
}

impl<T> Remotable for T
where
    T: Any + Send + Sync + fmt::Debug + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_remotable(&self) -> Box<dyn Remotable> {
        Box::new(self.clone())
    }

    fn eq_remotable(&self, other: &dyn Remotable) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl Clone for Box<dyn Remotable> {
    fn clone(&self) -> Self {
        self.clone_remotable()
    }
}

/// A Rust enum exposed to remote callers by member name.
///
/// Usually implemented through [`remote_enum!`](crate::remote_enum).
pub trait RemoteEnum: Copy + 'static {
    const TYPE_NAME: &'static str;
    /// Member names in declaration order.
    const MEMBERS: &'static [&'static str];

    fn ordinal(self) -> usize;
    fn from_ordinal(ordinal: usize) -> Option<Self>;

    fn member_name(self) -> &'static str {
        Self::MEMBERS.get(self.ordinal()).copied().unwrap_or_default()
    }
}

/// An enumeration constant inside the object tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    type_name: String,
    member: String,
    ordinal: usize,
}

impl EnumValue {
    #[must_use]
    pub fn new(type_name: impl Into<String>, member: impl Into<String>, ordinal: usize) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
            ordinal,
        }
    }

    #[must_use]
    pub fn of<E: RemoteEnum>(value: E) -> Self {
        Self::new(E::TYPE_NAME, value.member_name(), value.ordinal())
    }

    /// Recover a typed enum from an object, accepting either an enum constant of
    /// the right type or the bare member name.
    pub fn extract<E: RemoteEnum>(object: Object) -> Result<E, ConversionError> {
        let found = object.kind_name();
        let member = match &object {
            Object::Enum(value) if value.type_name == E::TYPE_NAME => value.member.as_str(),
            Object::Text(text) => text.as_str(),
            _ => return Err(ConversionError::new(E::TYPE_NAME, found)),
        };
        E::MEMBERS
            .iter()
            .position(|candidate| *candidate == member)
            .and_then(E::from_ordinal)
            .ok_or_else(|| ConversionError::new(E::TYPE_NAME, found))
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// A domain value as the codec and dispatcher see it.
///
/// `Set` holds distinct elements in no particular order; `SortedSet` holds
/// distinct elements in natural order. Both are kept as vectors so that beans
/// (which are neither `Hash` nor `Ord`) can be members.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(i128),
    BigDecimal(Decimal),
    Text(String),
    CharArray(Vec<char>),
    Uuid(Uuid),
    Date(Date),
    Enum(EnumValue),
    /// A reference to a type, by fully-qualified name.
    Type(String),
    List(Vec<Object>),
    Set(Vec<Object>),
    SortedSet(Vec<Object>),
    Array {
        component: TypeRef,
        items: Vec<Object>,
    },
    Map(BTreeMap<String, Object>),
    Bean(Box<dyn Remotable>),
}

impl Object {
    pub fn bean<T: Remotable>(value: T) -> Self {
        Object::Bean(Box::new(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Object::Text(value.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Object::Byte(_)
                | Object::Short(_)
                | Object::Int(_)
                | Object::Long(_)
                | Object::Float(_)
                | Object::Double(_)
                | Object::BigInteger(_)
                | Object::BigDecimal(_)
        )
    }

    fn is_integral(&self) -> bool {
        matches!(
            self,
            Object::Byte(_)
                | Object::Short(_)
                | Object::Int(_)
                | Object::Long(_)
                | Object::BigInteger(_)
        )
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Floating-point view of a numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Byte(v) => Some(f64::from(*v)),
            Object::Short(v) => Some(f64::from(*v)),
            Object::Int(v) => Some(f64::from(*v)),
            Object::Long(v) => Some(*v as f64),
            Object::Float(v) => Some(f64::from(*v)),
            Object::Double(v) => Some(*v),
            Object::BigInteger(v) => Some(*v as f64),
            Object::BigDecimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Integer view of a numeric value. Fractions truncate toward zero and
    /// out-of-range values saturate.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Byte(v) => Some(i64::from(*v)),
            Object::Short(v) => Some(i64::from(*v)),
            Object::Int(v) => Some(i64::from(*v)),
            Object::Long(v) => Some(*v),
            Object::Float(v) => Some(*v as i64),
            Object::Double(v) => Some(*v as i64),
            Object::BigInteger(v) => Some(i64::try_from(*v).unwrap_or(if *v < 0 {
                i64::MIN
            } else {
                i64::MAX
            })),
            Object::BigDecimal(v) => Some(v.trunc().to_i64().unwrap_or(if v.is_sign_negative() {
                i64::MIN
            } else {
                i64::MAX
            })),
            _ => None,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Object::BigInteger(v) => Some(*v),
            other if other.is_integral() => other.as_i64().map(i128::from),
            _ => None,
        }
    }

    pub fn as_bean<T: Remotable>(&self) -> Option<&T> {
        match self {
            Object::Bean(bean) => bean.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_bean_mut<T: Remotable>(&mut self) -> Option<&mut T> {
        match self {
            Object::Bean(bean) => bean.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    pub fn into_bean<T: Remotable>(self) -> Option<T> {
        match self {
            Object::Bean(bean) => bean.into_any().downcast::<T>().ok().map(|bean| *bean),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_remotable(&self) -> Option<&dyn Remotable> {
        match self {
            Object::Bean(bean) => Some(&**bean),
            _ => None,
        }
    }

    pub fn as_remotable_mut(&mut self) -> Option<&mut dyn Remotable> {
        match self {
            Object::Bean(bean) => Some(&mut **bean),
            _ => None,
        }
    }

    /// Short description of the runtime shape, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> String {
        match self {
            Object::Null => "null".to_string(),
            Object::Bool(_) => "boolean".to_string(),
            Object::Char(_) => "char".to_string(),
            Object::Byte(_) => "byte".to_string(),
            Object::Short(_) => "short".to_string(),
            Object::Int(_) => "int".to_string(),
            Object::Long(_) => "long".to_string(),
            Object::Float(_) => "float".to_string(),
            Object::Double(_) => "double".to_string(),
            Object::BigInteger(_) => "big integer".to_string(),
            Object::BigDecimal(_) => "big decimal".to_string(),
            Object::Text(_) => "text".to_string(),
            Object::CharArray(_) => "char[]".to_string(),
            Object::Uuid(_) => "uuid".to_string(),
            Object::Date(_) => "date".to_string(),
            Object::Enum(value) => value.type_name.clone(),
            Object::Type(_) => "type".to_string(),
            Object::List(_) => "list".to_string(),
            Object::Set(_) => "set".to_string(),
            Object::SortedSet(_) => "sorted set".to_string(),
            Object::Array { component, .. } => format!("{component}[]"),
            Object::Map(_) => "map".to_string(),
            Object::Bean(_) => "object".to_string(),
        }
    }

    /// Natural ordering, defined between values of comparable kinds only.
    ///
    /// Numbers compare across representations; enumeration constants compare
    /// by declaration order within one enumeration.
    #[must_use]
    pub fn natural_cmp(&self, other: &Object) -> Option<Ordering> {
        match (self, other) {
            (Object::Text(a), Object::Text(b)) => Some(a.cmp(b)),
            (Object::Char(a), Object::Char(b)) => Some(a.cmp(b)),
            (Object::Bool(a), Object::Bool(b)) => Some(a.cmp(b)),
            (Object::Uuid(a), Object::Uuid(b)) => Some(a.cmp(b)),
            (Object::Date(a), Object::Date(b)) => Some(a.cmp(b)),
            (Object::Type(a), Object::Type(b)) => Some(a.cmp(b)),
            (Object::Enum(a), Object::Enum(b)) if a.type_name == b.type_name => {
                Some(a.ordinal.cmp(&b.ordinal))
            }
            (Object::BigDecimal(a), Object::BigDecimal(b)) => Some(a.cmp(b)),
            (a, b) if a.is_integral() && b.is_integral() => Some(a.as_i128()?.cmp(&b.as_i128()?)),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            _ => None,
        }
    }
}

fn same_members(a: &[Object], b: &[Object]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Char(a), Object::Char(b)) => a == b,
            (Object::Byte(a), Object::Byte(b)) => a == b,
            (Object::Short(a), Object::Short(b)) => a == b,
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Long(a), Object::Long(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Double(a), Object::Double(b)) => a == b,
            (Object::BigInteger(a), Object::BigInteger(b)) => a == b,
            (Object::BigDecimal(a), Object::BigDecimal(b)) => a == b,
            (Object::Text(a), Object::Text(b)) => a == b,
            (Object::CharArray(a), Object::CharArray(b)) => a == b,
            (Object::Uuid(a), Object::Uuid(b)) => a == b,
            (Object::Date(a), Object::Date(b)) => a == b,
            (Object::Enum(a), Object::Enum(b)) => {
                a.type_name == b.type_name && a.member == b.member
            }
            (Object::Type(a), Object::Type(b)) => a == b,
            (Object::List(a), Object::List(b)) | (Object::SortedSet(a), Object::SortedSet(b)) => {
                a == b
            }
            (Object::Set(a), Object::Set(b)) => same_members(a, b),
            (
                Object::Array {
                    component: ca,
                    items: a,
                },
                Object::Array {
                    component: cb,
                    items: b,
                },
            ) => ca == cb && a == b,
            (Object::Map(a), Object::Map(b)) => a == b,
            (Object::Bean(a), Object::Bean(b)) => a.eq_remotable(&**b),
            _ => false,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Object]) -> fmt::Result {
    f.write_str("[")?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

/// The default textual form of a value.
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Bool(v) => write!(f, "{v}"),
            Object::Char(v) => write!(f, "{v}"),
            Object::Byte(v) => write!(f, "{v}"),
            Object::Short(v) => write!(f, "{v}"),
            Object::Int(v) => write!(f, "{v}"),
            Object::Long(v) => write!(f, "{v}"),
            Object::Float(v) => write!(f, "{v:?}"),
            Object::Double(v) => write!(f, "{v:?}"),
            Object::BigInteger(v) => write!(f, "{v}"),
            Object::BigDecimal(v) => write!(f, "{v}"),
            Object::Text(v) => f.write_str(v),
            Object::CharArray(v) => {
                for ch in v {
                    write!(f, "{ch}")?;
                }
                Ok(())
            }
            Object::Uuid(v) => write!(f, "{}", v.hyphenated()),
            Object::Date(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3f%z")),
            Object::Enum(v) => f.write_str(&v.member),
            Object::Type(name) => f.write_str(name),
            Object::List(items) | Object::Set(items) | Object::SortedSet(items) => {
                write_joined(f, items)
            }
            Object::Array { items, .. } => write_joined(f, items),
            Object::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Object::Bean(bean) => write!(f, "{bean:?}"),
        }
    }
}
