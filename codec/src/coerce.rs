//! Type coercion.
//!
//! [`coerce`] adapts a value to a declared type. Rules are tried in order and
//! the first that applies wins; a value no rule applies to is returned as is.

use std::cmp::Ordering;
use std::str::FromStr;

use courier_types::{Decimal, Object, TypeRef, Uuid};

use crate::date::parse_date;
use crate::error::MarshalError;
use crate::properties::TypeRegistry;

pub fn coerce(value: Object, target: &TypeRef, registry: &TypeRegistry) -> Result<Object, MarshalError> {
    match (value, target) {
        (Object::Null, _) => Ok(Object::Null),
        (value, target) if target.is_numeric() && value.is_numeric() => {
            if target.matches_shape(&value) {
                Ok(value)
            } else {
                convert_numeric(&value, target)
            }
        }
        (Object::List(items) | Object::Set(items) | Object::SortedSet(items), TypeRef::SortedSet) => {
            sorted_members(items).map(Object::SortedSet)
        }
        (Object::List(items) | Object::Set(items) | Object::SortedSet(items), TypeRef::Set) => {
            Ok(Object::Set(distinct_members(items)))
        }
        (Object::Text(text), TypeRef::CharArray) => Ok(Object::CharArray(text.chars().collect())),
        (Object::CharArray(chars), TypeRef::Text) => Ok(Object::Text(chars.into_iter().collect())),
        (Object::Text(text), TypeRef::Char) if text.chars().count() == 1 => {
            Ok(text.chars().next().map_or(Object::Null, Object::Char))
        }
        (Object::Text(text), TypeRef::Enum(type_name)) => {
            registry.enum_member(type_name, &text).map(Object::Enum)
        }
        (Object::Text(text), TypeRef::Uuid) => Uuid::parse_str(&text)
            .map(Object::Uuid)
            .map_err(|source| MarshalError::InvalidUuid {
                value: text.clone(),
                source,
            }),
        (Object::Text(text), TypeRef::Date) => parse_date(&text)
            .map(Object::Date)
            .map_err(|source| MarshalError::MalformedDate {
                value: text.clone(),
                source,
            }),
        (Object::Text(text), TypeRef::Text) => Ok(Object::Text(text)),
        (value, TypeRef::Text) => Ok(Object::Text(value.to_string())),
        (value, _) => Ok(value),
    }
}

fn convert_numeric(value: &Object, target: &TypeRef) -> Result<Object, MarshalError> {
    let out_of_range = || MarshalError::NumericRange {
        value: value.to_string(),
        target: target.to_string(),
    };
    let long = || value.as_i64().ok_or_else(out_of_range);
    let double = || value.as_f64().ok_or_else(out_of_range);
    Ok(match target {
        TypeRef::Byte => Object::Byte(long()? as i8),
        TypeRef::Short => Object::Short(long()? as i16),
        TypeRef::Int => Object::Int(long()? as i32),
        TypeRef::Long => Object::Long(long()?),
        TypeRef::Float => Object::Float(double()? as f32),
        TypeRef::Double => Object::Double(double()?),
        TypeRef::BigInteger => match value {
            Object::BigInteger(v) => Object::BigInteger(*v),
            _ => Object::BigInteger(i128::from(long()?)),
        },
        TypeRef::BigDecimal => Object::BigDecimal(decimal_from_f64(double()?).ok_or_else(out_of_range)?),
        _ => return Err(MarshalError::incompatible(value.kind_name(), target)),
    })
}

/// Decimal with the digits of the shortest text that round-trips `value`, so
/// `5.0` stays `5.0` and `0.1` stays `0.1`.
fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    let text = format!("{value:?}");
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Members ordered by natural comparison, equal members collapsed.
fn sorted_members(items: Vec<Object>) -> Result<Vec<Object>, MarshalError> {
    let incomparable = |item: &Object| MarshalError::Incomparable {
        type_name: item.kind_name(),
    };
    let mut sorted: Vec<Object> = Vec::with_capacity(items.len());
    for item in items {
        if item.natural_cmp(&item).is_none() {
            return Err(incomparable(&item));
        }
        let mut position = sorted.len();
        let mut duplicate = false;
        for (index, member) in sorted.iter().enumerate() {
            match member.natural_cmp(&item) {
                None => return Err(incomparable(&item)),
                Some(Ordering::Less) => {}
                Some(Ordering::Equal) => {
                    duplicate = true;
                    break;
                }
                Some(Ordering::Greater) => {
                    position = index;
                    break;
                }
            }
        }
        if !duplicate {
            sorted.insert(position, item);
        }
    }
    Ok(sorted)
}

fn distinct_members(items: Vec<Object>) -> Vec<Object> {
    let mut distinct: Vec<Object> = Vec::with_capacity(items.len());
    for item in items {
        if !distinct.contains(&item) {
            distinct.push(item);
        }
    }
    distinct
}
