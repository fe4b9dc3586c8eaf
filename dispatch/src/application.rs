//! The application: remote types, plugins and the dispatch chain.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use courier_codec::{
    Codec, CodecSettings, HookRegistry, MarshalError, PropertyPolicy, RegistryError, TypeRegistry,
    TypeRegistryBuilder, TypeSpec,
};
use courier_types::{Object, Remotable, RemoteEnum, TypeRef};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, info_span, warn};

use crate::envelope::{Call, CallPayload, Outcome, ResultEnvelope};
use crate::fault::{ConfigurationError, DispatchError, Fault, REMOTE_ERROR_TYPE, RemoteError};
use crate::interceptor::{Interceptor, InvocationContext, Plugin};
use crate::method::{CallError, RemoteMethod, RemoteType};

// ============================================================================
// Builder
// ============================================================================

/// Collects types, remote methods and plugins, then freezes them into an
/// [`Application`].
///
/// Registration errors are held until [`ApplicationBuilder::build`], which
/// reports the first one.
pub struct ApplicationBuilder {
    name: String,
    whitelist: bool,
    settings: CodecSettings,
    hooks: HookRegistry,
    types: TypeRegistryBuilder,
    remote: Vec<RemoteType>,
    plugins: Vec<Arc<dyn Plugin>>,
    failure: Option<RegistryError>,
}

impl ApplicationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whitelist: true,
            settings: CodecSettings::default(),
            hooks: HookRegistry::default(),
            types: TypeRegistry::builder(),
            remote: Vec::new(),
            plugins: Vec::new(),
            failure: None,
        }
    }

    /// Registers a bean type that travels on the wire but exposes no methods.
    pub fn register_type<T: Remotable>(mut self, spec: TypeSpec<T>) -> Self {
        let result = self.types.register(spec);
        self.record(result);
        self
    }

    pub fn register_enum<E: RemoteEnum>(mut self) -> Self {
        let result = self.types.register_enum::<E>();
        self.record(result);
        self
    }

    pub fn register_remote(mut self, remote: RemoteType) -> Self {
        self.remote.push(remote);
        self
    }

    /// Adds a plugin. Its interceptors run in registration order.
    pub fn register_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Whitelist encoding (the default) sends only opted-in properties.
    pub fn whitelist_properties(mut self, whitelist: bool) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.settings.max_depth = max_depth;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.settings.pretty = pretty;
        self
    }

    fn record(&mut self, result: Result<(), RegistryError>) {
        if let Err(err) = result
            && self.failure.is_none()
        {
            self.failure = Some(err);
        }
    }

    pub fn build(self) -> Result<Application, ConfigurationError> {
        let name = self.name.clone();
        self.assemble().inspect_err(|err| {
            error!(application = %name, "Invalid application configuration: {err}");
        })
    }

    fn assemble(mut self) -> Result<Application, ConfigurationError> {
        if let Some(err) = self.failure.take() {
            return Err(err.into());
        }
        self.types.register(RemoteError::spec())?;

        let mut remote = std::mem::take(&mut self.remote);
        for plugin in &self.plugins {
            let contributed = plugin.remote_types();
            debug!(plugin = plugin.name(), count = contributed.len(), "Plugin remote types");
            remote.extend(contributed);
        }

        let mut methods_by_type: BTreeMap<String, Vec<RemoteMethod>> = BTreeMap::new();
        for remote_type in remote {
            let (type_name, descriptor, methods) = remote_type.into_parts();
            if methods_by_type.contains_key(&type_name) {
                return Err(ConfigurationError::DuplicateRemoteType { type_name });
            }
            if let Some(descriptor) = descriptor {
                self.types.register(descriptor)?;
            }
            methods_by_type.insert(type_name, methods);
        }

        let registry = self.types.build()?;
        for (type_name, methods) in &methods_by_type {
            let has_instance_methods = methods.iter().any(|method| !method.is_static());
            if has_instance_methods && !registry.is_registered(type_name) {
                return Err(ConfigurationError::UnknownRemoteType {
                    type_name: type_name.clone(),
                });
            }
            let mut seen = BTreeSet::new();
            for method in methods
                .iter()
                .filter(|method| method.eligibility().permits(&self.name))
            {
                if !seen.insert(method.name()) {
                    return Err(ConfigurationError::DuplicateRemoteMethod {
                        type_name: type_name.clone(),
                        method: method.name().to_string(),
                    });
                }
            }
        }

        let codec = Codec::new(Arc::new(registry))
            .with_hooks(self.hooks)
            .with_settings(self.settings);
        info!(
            application = %self.name,
            remote_types = methods_by_type.len(),
            plugins = self.plugins.len(),
            "Application ready"
        );
        Ok(Application {
            name: self.name,
            policy: PropertyPolicy::from_whitelist(self.whitelist),
            codec,
            methods_by_type,
            plugins: self.plugins,
        })
    }
}

// ============================================================================
// Application
// ============================================================================

/// A frozen set of remote types served under one application name.
///
/// Immutable after [`ApplicationBuilder::build`]; share it across threads
/// behind an `Arc`.
pub struct Application {
    name: String,
    policy: PropertyPolicy,
    codec: Codec,
    methods_by_type: BTreeMap<String, Vec<RemoteMethod>>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl Application {
    pub fn builder(name: impl Into<String>) -> ApplicationBuilder {
        ApplicationBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn policy(&self) -> PropertyPolicy {
        self.policy
    }

    #[must_use]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Names of every type with remote methods, sorted.
    #[must_use]
    pub fn remote_types(&self) -> Vec<&str> {
        self.methods_by_type.keys().map(String::as_str).collect()
    }

    /// Methods of `type_name` callable from this application, in declaration order.
    #[must_use]
    pub fn remote_methods(&self, type_name: &str) -> Vec<&RemoteMethod> {
        self.methods_by_type
            .get(type_name)
            .map(|methods| {
                methods
                    .iter()
                    .filter(|method| method.eligibility().permits(&self.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Invokes a method from a wire payload and returns the encoded envelope.
    pub fn invoke(&self, type_name: &str, method: &str, payload: &Value) -> ResultEnvelope {
        let outcome = self.execute(type_name, method, |remote| {
            self.decode_call(type_name, remote, payload)
        });
        self.encode_outcome(&outcome)
    }

    /// [`Application::invoke`] over JSON text.
    pub fn invoke_json(&self, type_name: &str, method: &str, payload: &str) -> String {
        let envelope = match serde_json::from_str::<Value>(payload) {
            Ok(payload) => self.invoke(type_name, method, &payload),
            Err(err) => {
                info!(type_name, method, "Unreadable call payload: {err}");
                self.encode_outcome(&Outcome::Failure(MarshalError::from(err).into()))
            }
        };
        let text = if self.codec.settings().pretty {
            serde_json::to_string_pretty(&envelope)
        } else {
            serde_json::to_string(&envelope)
        };
        text.unwrap_or_else(|err| {
            error!("Failed to write result envelope: {err}");
            json!({
                "result": null,
                "exception": { "@class": REMOTE_ERROR_TYPE, "kind": "Marshal", "message": err.to_string() }
            })
            .to_string()
        })
    }

    /// Runs an already decoded call through the full chain.
    pub fn dispatch(&self, type_name: &str, method: &str, call: Call) -> Outcome {
        self.execute(type_name, method, |_| Ok(call))
    }

    /// Encodes an outcome with this application's property policy.
    pub fn encode_outcome(&self, outcome: &Outcome) -> ResultEnvelope {
        let encoded = match outcome {
            Outcome::Success(result) => {
                self.codec
                    .encode(result, self.policy)
                    .map(|result| ResultEnvelope {
                        result,
                        exception: Value::Null,
                    })
            }
            Outcome::Failure(fault) => self
                .codec
                .encode(&fault.to_object(), self.policy)
                .map(|exception| ResultEnvelope {
                    result: Value::Null,
                    exception,
                }),
        };
        encoded.unwrap_or_else(|err| {
            warn!("Result could not be encoded: {err}");
            self.marshal_failure(&err)
        })
    }

    fn marshal_failure(&self, err: &MarshalError) -> ResultEnvelope {
        let remote = RemoteError::new("Marshal", err.to_string());
        let exception = self
            .codec
            .encode(&Object::bean(remote.clone()), self.policy)
            .unwrap_or_else(|_| {
                json!({ "@class": REMOTE_ERROR_TYPE, "kind": remote.kind, "message": remote.message })
            });
        ResultEnvelope {
            result: Value::Null,
            exception,
        }
    }

    fn execute<F>(&self, type_name: &str, method_name: &str, decode: F) -> Outcome
    where
        F: FnOnce(&RemoteMethod) -> Result<Call, Fault>,
    {
        let span = info_span!("dispatch", application = %self.name, type_name, method = method_name);
        let _entered = span.enter();

        let method = match self.resolve(type_name, method_name) {
            Ok(method) => method,
            Err(err) => {
                warn!("Rejected call: {err}");
                return Outcome::Failure(err.into());
            }
        };
        let prepared =
            decode(method).and_then(|call| self.prepare_call(type_name, method, call));
        let (target, arguments) = match prepared {
            Ok(prepared) => prepared,
            Err(fault) => {
                info!("Returning exception from {type_name}.{method_name}: {fault}");
                return Outcome::Failure(fault);
            }
        };

        let mut context =
            InvocationContext::new(&self.name, type_name, method.name(), method.is_static());
        let mut interceptors: Vec<Box<dyn Interceptor>> = self
            .plugins
            .iter()
            .map(|plugin| plugin.build_interceptor())
            .collect();

        let mut succeeded = 0;
        let intercepted = self.intercept(
            &mut context,
            &mut interceptors,
            &mut succeeded,
            method,
            target,
            arguments,
        );
        match intercepted {
            Ok(result) => Outcome::Success(result),
            Err(fault) => {
                // Interceptors whose success hook already completed are not
                // told about the failure.
                let fault = interceptors
                    .iter_mut()
                    .skip(succeeded)
                    .fold(fault.unwrap_invocation(), |fault, interceptor| {
                        interceptor.on_failure(&mut context, fault)
                    });
                info!("Returning exception from {type_name}.{method_name}: {fault}");
                Outcome::Failure(fault)
            }
        }
    }

    fn resolve(&self, type_name: &str, method_name: &str) -> Result<&RemoteMethod, DispatchError> {
        let methods = self
            .methods_by_type
            .get(type_name)
            .ok_or_else(|| DispatchError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        let mut named = methods
            .iter()
            .filter(|method| method.name() == method_name)
            .peekable();
        if named.peek().is_none() {
            return Err(DispatchError::NoSuchMethod {
                type_name: type_name.to_string(),
                method: method_name.to_string(),
            });
        }
        named
            .find(|method| method.eligibility().permits(&self.name))
            .ok_or_else(|| DispatchError::NotRemote {
                type_name: type_name.to_string(),
                method: method_name.to_string(),
            })
    }

    fn decode_call(
        &self,
        type_name: &str,
        method: &RemoteMethod,
        payload: &Value,
    ) -> Result<Call, Fault> {
        let payload = CallPayload::deserialize(payload).map_err(MarshalError::from)?;
        check_arity(method, payload.arguments.len())?;

        let target = if method.is_static() || payload.target.is_null() {
            None
        } else {
            Some(self.codec.decode(&payload.target, &TypeRef::bean(type_name))?)
        };
        let arguments = payload
            .arguments
            .iter()
            .zip(method.parameters())
            .map(|(wire, parameter)| self.codec.decode(wire, parameter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Call { target, arguments })
    }

    /// Checks the target and coerces each argument to its parameter type.
    fn prepare_call(
        &self,
        type_name: &str,
        method: &RemoteMethod,
        call: Call,
    ) -> Result<(Option<Object>, Vec<Object>), Fault> {
        check_arity(method, call.arguments.len())?;

        let target = if method.is_static() {
            None
        } else {
            match call.target {
                Some(target) if !target.is_null() => {
                    self.check_target(type_name, method, &target)?;
                    Some(target)
                }
                _ => {
                    return Err(DispatchError::MissingTarget {
                        type_name: type_name.to_string(),
                        method: method.name().to_string(),
                    }
                    .into());
                }
            }
        };

        let registry = self.codec.registry();
        let mut arguments = Vec::with_capacity(call.arguments.len());
        for (argument, parameter) in call.arguments.into_iter().zip(method.parameters()) {
            let coerced = self.codec.coerce(argument, parameter)?;
            if !registry.accepts(parameter, &coerced) {
                return Err(MarshalError::Incompatible {
                    found: self.describe(&coerced),
                    expected: parameter.to_string(),
                }
                .into());
            }
            arguments.push(coerced);
        }
        Ok((target, arguments))
    }

    fn check_target(
        &self,
        type_name: &str,
        method: &RemoteMethod,
        target: &Object,
    ) -> Result<(), DispatchError> {
        if self
            .codec
            .registry()
            .accepts(&TypeRef::bean(type_name), target)
        {
            return Ok(());
        }
        Err(DispatchError::TargetType {
            type_name: type_name.to_string(),
            method: method.name().to_string(),
            found: self.describe(target),
        })
    }

    fn intercept(
        &self,
        context: &mut InvocationContext,
        interceptors: &mut [Box<dyn Interceptor>],
        succeeded: &mut usize,
        method: &RemoteMethod,
        target: Option<Object>,
        arguments: Vec<Object>,
    ) -> Result<Object, Fault> {
        for interceptor in interceptors.iter_mut() {
            interceptor.before_invocation(context)?;
        }

        let mut target = target;
        if let Some(mut current) = target.take() {
            for interceptor in interceptors.iter_mut() {
                current = interceptor.replace_target(context, current)?;
            }
            target = Some(current);
        }

        let expected = arguments.len();
        let mut arguments = arguments;
        for interceptor in interceptors.iter_mut() {
            arguments = interceptor.prepare_arguments(context, target.as_ref(), arguments)?;
            if arguments.len() != expected {
                return Err(DispatchError::ArityChanged {
                    method: method.name().to_string(),
                    expected,
                    found: arguments.len(),
                }
                .into());
            }
        }

        // Inherited methods run against the declaring type's part of the target.
        let registry = self.codec.registry();
        let receiver = target
            .as_mut()
            .and_then(Object::as_remotable_mut)
            .and_then(|bean| registry.upcast(bean, context.type_name()));
        let mut result = match method.call(receiver, arguments) {
            Ok(result) => result,
            Err(CallError::Fault(fault)) => return Err(Fault::invocation(method.name(), fault)),
            Err(CallError::Target) => {
                let found = target.as_ref().map_or_else(|| "null".to_string(), |t| self.describe(t));
                return Err(DispatchError::TargetType {
                    type_name: context.type_name().to_string(),
                    method: method.name().to_string(),
                    found,
                }
                .into());
            }
        };

        if !result.is_null() {
            for interceptor in interceptors.iter_mut() {
                result = interceptor.replace_result(context, result)?;
            }
        }
        for interceptor in interceptors.iter_mut() {
            interceptor.on_success(context, target.as_ref(), &result)?;
            *succeeded += 1;
        }
        Ok(result)
    }

    /// Registered type name of a bean, or the kind of any other value.
    fn describe(&self, value: &Object) -> String {
        value
            .as_remotable()
            .and_then(|bean| self.codec.registry().type_name_of(bean))
            .map_or_else(|| value.kind_name(), str::to_string)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("remote_types", &self.remote_types())
            .field("plugins", &plugins)
            .finish_non_exhaustive()
    }
}

fn check_arity(method: &RemoteMethod, found: usize) -> Result<(), DispatchError> {
    let expected = method.parameters().len();
    if found == expected {
        return Ok(());
    }
    Err(DispatchError::ArityMismatch {
        method: method.name().to_string(),
        expected,
        found,
    })
}
