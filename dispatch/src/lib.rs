//! Remote invocation for Courier.
//!
//! An [`Application`] maps type and method names to registered
//! [`RemoteMethod`]s. Each call is decoded with the application's codec, run
//! through the interceptors of every registered [`Plugin`], and answered with a
//! [`ResultEnvelope`] holding either the encoded result or the encoded fault.
//! Nothing a method or interceptor does escapes the dispatcher.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod application;
mod envelope;
mod fault;
mod interceptor;
mod method;

pub use application::{Application, ApplicationBuilder};
pub use envelope::{Call, CallPayload, Outcome, ResultEnvelope};
pub use fault::{ConfigurationError, DispatchError, Fault, REMOTE_ERROR_TYPE, RemoteError};
pub use interceptor::{Interceptor, InvocationContext, Plugin};
pub use method::{Arguments, Eligibility, RemoteMethod, RemoteType};
