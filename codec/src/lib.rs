//! Polymorphic marshalling for Courier.
//!
//! Converts [`Object`] trees to and from a JSON wire format in which plain
//! objects carry their fully-qualified type name under the `"@class"` key.
//! Decoding recovers concrete types from those tags, binds wire entries to
//! registered properties, and coerces values to each property's declared type.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod coerce;
mod date;
mod decode;
mod encode;
mod error;
mod hooks;
mod properties;

use std::sync::Arc;

use courier_types::{Object, TypeRef};
use serde_json::Value;

pub use coerce::coerce;
pub use date::{DATE_FORMAT, format_date, parse_date};
pub use encode::{EncodeContext, PropertyPolicy};
pub use error::{MarshalError, RegistryError};
pub use hooks::{DeserializationHook, HookRegistry, SerializationHook};
pub use properties::{
    EnumDescriptor, MESSAGE_PROPERTY, PropertyDescriptor, PropertyTable, TypeDescriptor,
    TypeRegistry, TypeRegistryBuilder, TypeSpec,
};

use decode::Decoder;
use encode::Encoder;

/// Default nesting limit for encode and decode.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Longest wire excerpt quoted in a decode error.
const EXCERPT_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSettings {
    /// Deepest nesting of arrays and maps accepted in either direction.
    pub max_depth: usize,
    /// Indent JSON text output.
    pub pretty: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: false,
        }
    }
}

/// The marshalling codec: a frozen type registry plus hook lists.
///
/// Cheap to share across threads; the only mutable state is the registry's
/// property cache.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<TypeRegistry>,
    hooks: HookRegistry,
    settings: CodecSettings,
}

impl Codec {
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            hooks: HookRegistry::default(),
            settings: CodecSettings::default(),
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: CodecSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    #[must_use]
    pub fn settings(&self) -> CodecSettings {
        self.settings
    }

    /// Encodes `value` with a fresh hook context.
    pub fn encode(&self, value: &Object, policy: PropertyPolicy) -> Result<Value, MarshalError> {
        self.encode_with(value, policy, &mut EncodeContext::new())
    }

    /// Encodes `value`, sharing `context` with every serialization hook.
    pub fn encode_with(
        &self,
        value: &Object,
        policy: PropertyPolicy,
        context: &mut EncodeContext,
    ) -> Result<Value, MarshalError> {
        Encoder::new(self, policy, context).encode(value, 0)
    }

    /// Decodes `wire` against `target`.
    ///
    /// Any failure is reported once, as [`MarshalError::Decode`] carrying an
    /// excerpt of the offending wire value and the cause.
    pub fn decode(&self, wire: &Value, target: &TypeRef) -> Result<Object, MarshalError> {
        Decoder::new(self)
            .decode(wire, target, 0)
            .map_err(|source| MarshalError::Decode {
                value: excerpt(wire),
                source: Box::new(source),
            })
    }

    pub fn coerce(&self, value: Object, target: &TypeRef) -> Result<Object, MarshalError> {
        coerce(value, target, &self.registry)
    }

    pub fn to_json_string(
        &self,
        value: &Object,
        policy: PropertyPolicy,
    ) -> Result<String, MarshalError> {
        let wire = self.encode(value, policy)?;
        let text = if self.settings.pretty {
            serde_json::to_string_pretty(&wire)?
        } else {
            serde_json::to_string(&wire)?
        };
        Ok(text)
    }

    pub fn from_json_str(&self, text: &str, target: &TypeRef) -> Result<Object, MarshalError> {
        let wire: Value = serde_json::from_str(text)?;
        self.decode(&wire, target)
    }
}

fn excerpt(wire: &Value) -> String {
    let text = wire.to_string();
    if text.chars().count() <= EXCERPT_LIMIT {
        return text;
    }
    let mut cut: String = text.chars().take(EXCERPT_LIMIT).collect();
    cut.push_str("...");
    cut
}
