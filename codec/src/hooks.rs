//! Substitution hooks run at every encode and decode step.

use std::fmt;
use std::sync::Arc;

use courier_types::Object;
use serde_json::Value;

use crate::encode::EncodeContext;
use crate::error::MarshalError;

/// Runs before a non-null value is encoded and may replace it, e.g. with a
/// reference stub for an object already written in this call.
pub trait SerializationHook: Send + Sync {
    fn substitute(
        &self,
        value: &Object,
        context: &mut EncodeContext,
    ) -> Result<Option<Object>, MarshalError>;
}

impl<F> SerializationHook for F
where
    F: Fn(&Object, &mut EncodeContext) -> Result<Option<Object>, MarshalError> + Send + Sync,
{
    fn substitute(
        &self,
        value: &Object,
        context: &mut EncodeContext,
    ) -> Result<Option<Object>, MarshalError> {
        self(value, context)
    }
}

/// Runs after a wire value is structurally decoded and may replace the result,
/// e.g. resolving a reference stub. Receives the original wire value as well.
pub trait DeserializationHook: Send + Sync {
    fn resolve(&self, decoded: Object, wire: &Value) -> Result<Object, MarshalError>;
}

impl<F> DeserializationHook for F
where
    F: Fn(Object, &Value) -> Result<Object, MarshalError> + Send + Sync,
{
    fn resolve(&self, decoded: Object, wire: &Value) -> Result<Object, MarshalError> {
        self(decoded, wire)
    }
}

/// Ordered hook lists, fixed once the codec is built.
#[derive(Clone, Default)]
pub struct HookRegistry {
    serializers: Vec<Arc<dyn SerializationHook>>,
    deserializers: Vec<Arc<dyn DeserializationHook>>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serializer(mut self, hook: impl SerializationHook + 'static) -> Self {
        self.serializers.push(Arc::new(hook));
        self
    }

    pub fn with_deserializer(mut self, hook: impl DeserializationHook + 'static) -> Self {
        self.deserializers.push(Arc::new(hook));
        self
    }

    pub(crate) fn serializers(&self) -> &[Arc<dyn SerializationHook>] {
        &self.serializers
    }

    pub(crate) fn deserializers(&self) -> &[Arc<dyn DeserializationHook>] {
        &self.deserializers
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("serializers", &self.serializers.len())
            .field("deserializers", &self.deserializers.len())
            .finish()
    }
}
