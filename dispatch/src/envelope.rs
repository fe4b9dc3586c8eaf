//! Call payloads and result envelopes.

use courier_types::Object;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fault::Fault;

/// Wire form of a call: `{"target": ..., "arguments": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallPayload {
    #[serde(default)]
    pub target: Value,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// A decoded call.
#[derive(Debug, Clone, Default)]
pub struct Call {
    pub target: Option<Object>,
    pub arguments: Vec<Object>,
}

impl Call {
    #[must_use]
    pub fn on(target: Object) -> Self {
        Self {
            target: Some(target),
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: Object) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// Wire form of a result. At most one field is non-null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub result: Value,
    pub exception: Value,
}

impl ResultEnvelope {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.exception.is_null()
    }
}

/// How a dispatched call ended, before encoding.
#[derive(Debug)]
pub enum Outcome {
    Success(Object),
    Failure(Fault),
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&Object> {
        match self {
            Outcome::Success(result) => Some(result),
            Outcome::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(fault) => Some(fault),
        }
    }
}
