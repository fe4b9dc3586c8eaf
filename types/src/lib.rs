//! Runtime object model for Courier.
//!
//! This crate contains the values the codec and dispatcher move around: the
//! [`Object`] tree that stands in for reflected domain objects, the declared
//! [`TypeRef`] a value is bound against, and the [`IntoObject`] / [`FromObject`]
//! conversions between plain Rust values and objects. No IO, no async.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod convert;
mod extensions;
mod object;
mod type_ref;

pub use convert::{ConversionError, FromObject, IntoObject};
pub use extensions::Extensions;
pub use object::{EnumValue, Object, RemoteEnum, Remotable};
pub use rust_decimal::Decimal;
pub use type_ref::TypeRef;
pub use uuid::Uuid;

/// Date/time values carried by the object model.
pub type Date = chrono::DateTime<chrono::FixedOffset>;

/// Reserved wire-map key holding a fully-qualified type name.
pub const TYPE_TAG: &str = "@class";

/// Type tag written on encoded dates.
pub const DATE_TYPE: &str = "courier.Date";

/// Wire-map key holding the ISO-8601 text of an encoded date.
pub const DATE_FIELD: &str = "value";

/// Implements [`IntoObject`] and [`FromObject`] for registered bean types.
///
/// ```ignore
/// courier_types::bean_conversions!(Address, Customer);
/// ```
#[macro_export]
macro_rules! bean_conversions {
    ($($bean:ty),+ $(,)?) => {
        $(
            impl $crate::IntoObject for $bean {
                fn into_object(self) -> $crate::Object {
                    $crate::Object::bean(self)
                }
            }

            impl $crate::FromObject for $bean {
                fn from_object(object: $crate::Object) -> Result<Self, $crate::ConversionError> {
                    let found = object.kind_name();
                    object
                        .into_bean::<$bean>()
                        .ok_or_else(|| $crate::ConversionError::new(stringify!($bean), found))
                }
            }
        )+
    };
}

/// Declares a remotely visible enumeration.
///
/// Generates the enum, its [`RemoteEnum`] impl (members in declaration order)
/// and the object conversions.
///
/// ```ignore
/// courier_types::remote_enum! {
///     pub enum State as "bank.State" { CA, NY, TX }
/// }
/// ```
#[macro_export]
macro_rules! remote_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $type_name:literal { $($member:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($member),+
        }

        impl $crate::RemoteEnum for $name {
            const TYPE_NAME: &'static str = $type_name;
            const MEMBERS: &'static [&'static str] = &[$(stringify!($member)),+];

            fn ordinal(self) -> usize {
                self as usize
            }

            fn from_ordinal(ordinal: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$member),+];
                ALL.get(ordinal).copied()
            }
        }

        impl $crate::IntoObject for $name {
            fn into_object(self) -> $crate::Object {
                $crate::Object::Enum($crate::EnumValue::of(self))
            }
        }

        impl $crate::FromObject for $name {
            fn from_object(object: $crate::Object) -> Result<Self, $crate::ConversionError> {
                $crate::EnumValue::extract::<$name>(object)
            }
        }
    };
}
