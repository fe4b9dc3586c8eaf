use courier_types::ConversionError;
use thiserror::Error;

/// Failure while encoding, decoding or coercing a value.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("Unknown type tag: {tag}")]
    UnknownTypeTag { tag: String },
    #[error("Type tag {tag} is not assignable to {expected}")]
    TagMismatch { tag: String, expected: String },
    #[error("Type is not registered: {type_name}")]
    UnregisteredType { type_name: String },
    #[error("No readable or writeable property {property} on {type_name}")]
    UnknownProperty { type_name: String, property: String },
    #[error("Malformed date {value:?}: {source}")]
    MalformedDate {
        value: String,
        source: chrono::ParseError,
    },
    #[error("Unable to construct {type_name}: {reason}")]
    Construct { type_name: String, reason: String },
    #[error("{member:?} is not a member of {type_name}")]
    UnknownEnumMember { type_name: String, member: String },
    #[error("Invalid uuid {value:?}: {source}")]
    InvalidUuid { value: String, source: uuid::Error },
    #[error("Object of type {found} cannot be used in place of {expected}")]
    Incompatible { found: String, expected: String },
    #[error("Values of type {type_name} have no natural order")]
    Incomparable { type_name: String },
    #[error("{value} is out of range for {target}")]
    NumericRange { value: String, target: String },
    #[error("Nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
    #[error("Property {type_name}.{property}: {source}")]
    Property {
        type_name: String,
        property: String,
        source: Box<MarshalError>,
    },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("Unable to decode {value}: {source}")]
    Decode {
        value: String,
        source: Box<MarshalError>,
    },
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarshalError {
    pub(crate) fn incompatible(found: impl Into<String>, expected: impl ToString) -> Self {
        MarshalError::Incompatible {
            found: found.into(),
            expected: expected.to_string(),
        }
    }

    pub(crate) fn in_property(self, type_name: &str, property: &str) -> Self {
        MarshalError::Property {
            type_name: type_name.to_string(),
            property: property.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through property and decode wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &MarshalError {
        match self {
            MarshalError::Property { source, .. } | MarshalError::Decode { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// Rejected type registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate type registered: {name}")]
    DuplicateType { name: String },
    #[error("Rust type {rust_type} registered as both {first} and {second}")]
    DuplicateBinding {
        rust_type: &'static str,
        first: String,
        second: String,
    },
    #[error("Type {name} extends unregistered type {parent}")]
    UnknownParent { name: String, parent: String },
    #[error("Type name is reserved: {name}")]
    ReservedName { name: String },
}
