//! Errors raised while dispatching a call, and the value stored in the
//! envelope's exception slot.

use courier_codec::{MarshalError, RegistryError, TypeSpec};
use courier_types::{IntoObject, Object, TypeRef, bean_conversions};
use thiserror::Error;

/// Wire name of the built-in error type carrying dispatcher failures.
pub const REMOTE_ERROR_TYPE: &str = "courier.RemoteError";

/// Error-shaped bean describing a failure the dispatcher itself detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: String,
    pub message: String,
}

bean_conversions!(RemoteError);

impl RemoteError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub(crate) fn spec() -> TypeSpec<RemoteError> {
        TypeSpec::<RemoteError>::new(REMOTE_ERROR_TYPE)
            .error_shaped()
            .include_all()
            .property("kind", TypeRef::Text, |e| e.kind.clone(), |e, v| e.kind = v)
            .property(
                "message",
                TypeRef::Text,
                |e| e.message.clone(),
                |e, v| e.message = v,
            )
    }
}

/// Setup-time failures. An application that fails to build never serves calls.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Duplicate remote method {method} on type {type_name}")]
    DuplicateRemoteMethod { type_name: String, method: String },
    #[error("Duplicate remote type registered: {type_name}")]
    DuplicateRemoteType { type_name: String },
    #[error("Remote type {type_name} is not a registered type")]
    UnknownRemoteType { type_name: String },
}

/// Per-call failures detected by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },
    #[error("No method {method} found on type {type_name}")]
    NoSuchMethod { type_name: String, method: String },
    #[error("Method {method} on type {type_name} is not remotely executable")]
    NotRemote { type_name: String, method: String },
    #[error("Method {method} on type {type_name} needs a target")]
    MissingTarget { type_name: String, method: String },
    #[error("Target of {method} must be a {type_name}, found {found}")]
    TargetType {
        type_name: String,
        method: String,
        found: String,
    },
    #[error("Method {method} takes {expected} arguments, got {found}")]
    ArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("Interceptor changed the argument count of {method} from {expected} to {found}")]
    ArityChanged {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

impl DispatchError {
    /// Stable name reported in [`RemoteError::kind`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownType { .. } => "UnknownType",
            DispatchError::NoSuchMethod { .. } => "NoSuchMethod",
            DispatchError::NotRemote { .. } => "NotRemote",
            DispatchError::MissingTarget { .. } => "MissingTarget",
            DispatchError::TargetType { .. } => "TargetType",
            DispatchError::ArityMismatch { .. } | DispatchError::ArityChanged { .. } => "Arity",
            DispatchError::Marshal(_) => "Marshal",
        }
    }
}

/// What a failed call carries into the exception slot.
#[derive(Debug, Error)]
pub enum Fault {
    /// A domain error raised by a method or interceptor.
    #[error("Raised {0}")]
    Raised(Object),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// Wrapping added around everything the invoked method raises.
    #[error("Invocation of {method} failed: {cause}")]
    Invocation {
        method: String,
        #[source]
        cause: Box<Fault>,
    },
}

impl Fault {
    /// Raises a domain error, usually an error-shaped bean.
    pub fn raise(error: impl IntoObject) -> Self {
        Fault::Raised(error.into_object())
    }

    pub(crate) fn invocation(method: &str, cause: Fault) -> Self {
        Fault::Invocation {
            method: method.to_string(),
            cause: Box::new(cause),
        }
    }

    /// Strips one level of invocation wrapping.
    #[must_use]
    pub fn unwrap_invocation(self) -> Fault {
        match self {
            Fault::Invocation { cause, .. } => *cause,
            other => other,
        }
    }

    #[must_use]
    pub fn raised(&self) -> Option<&Object> {
        match self {
            Fault::Raised(object) => Some(object),
            _ => None,
        }
    }

    /// The object written to the exception slot.
    #[must_use]
    pub fn to_object(&self) -> Object {
        match self {
            Fault::Raised(object) => object.clone(),
            Fault::Dispatch(error) => {
                Object::bean(RemoteError::new(error.kind(), error.to_string()))
            }
            Fault::Invocation { .. } => Object::bean(RemoteError::new("Invocation", self.to_string())),
        }
    }
}

impl From<MarshalError> for Fault {
    fn from(error: MarshalError) -> Self {
        Fault::Dispatch(DispatchError::Marshal(error))
    }
}

impl From<courier_types::ConversionError> for Fault {
    fn from(error: courier_types::ConversionError) -> Self {
        Fault::from(MarshalError::from(error))
    }
}
