//! Per-call interceptors and the context they share.

use courier_types::{Extensions, Object};

use crate::fault::Fault;
use crate::method::RemoteType;

/// Describes the call in progress. Passed to every interceptor hook.
#[derive(Debug)]
pub struct InvocationContext {
    application: String,
    type_name: String,
    method: String,
    is_static: bool,
    extensions: Extensions,
}

impl InvocationContext {
    pub(crate) fn new(application: &str, type_name: &str, method: &str, is_static: bool) -> Self {
        Self {
            application: application.to_string(),
            type_name: type_name.to_string(),
            method: method.to_string(),
            is_static,
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn application(&self) -> &str {
        &self.application
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Per-call state shared between interceptors.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Hooks around one remote invocation.
///
/// A fresh interceptor is built for every call, so implementations may keep
/// mutable state in `self`. Each phase runs for every interceptor, in plugin
/// registration order, before the next phase starts.
pub trait Interceptor: Send {
    /// Runs before anything else. An error aborts the call.
    fn before_invocation(&mut self, _context: &mut InvocationContext) -> Result<(), Fault> {
        Ok(())
    }

    /// Substitutes the target. Not called for static methods.
    fn replace_target(
        &mut self,
        _context: &mut InvocationContext,
        target: Object,
    ) -> Result<Object, Fault> {
        Ok(target)
    }

    /// Replaces the arguments. Must return as many as it was given.
    fn prepare_arguments(
        &mut self,
        _context: &mut InvocationContext,
        _target: Option<&Object>,
        arguments: Vec<Object>,
    ) -> Result<Vec<Object>, Fault> {
        Ok(arguments)
    }

    /// Substitutes a non-null result.
    fn replace_result(
        &mut self,
        _context: &mut InvocationContext,
        result: Object,
    ) -> Result<Object, Fault> {
        Ok(result)
    }

    /// Runs after a successful invocation.
    fn on_success(
        &mut self,
        _context: &mut InvocationContext,
        _target: Option<&Object>,
        _result: &Object,
    ) -> Result<(), Fault> {
        Ok(())
    }

    /// Runs after any failure, and may translate it.
    fn on_failure(&mut self, _context: &mut InvocationContext, fault: Fault) -> Fault {
        fault
    }
}

/// Builds interceptors and contributes remote types.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn build_interceptor(&self) -> Box<dyn Interceptor>;

    /// Remote types registered alongside the application's own.
    fn remote_types(&self) -> Vec<RemoteType> {
        Vec::new()
    }
}
