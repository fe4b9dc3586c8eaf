//! Remote method declarations.

use std::fmt;
use std::sync::Arc;
use std::vec;

use courier_codec::{TypeDescriptor, TypeSpec};
use courier_types::{FromObject, IntoObject, Object, Remotable, TypeRef};

use crate::fault::Fault;

/// Why a handler could not run the method body.
pub(crate) enum CallError {
    /// The target is absent or not of the declaring type.
    Target,
    Fault(Fault),
}

impl From<Fault> for CallError {
    fn from(fault: Fault) -> Self {
        CallError::Fault(fault)
    }
}

type Handler =
    Arc<dyn Fn(Option<&mut dyn Remotable>, Arguments) -> Result<Object, CallError> + Send + Sync>;

/// Where a method may be invoked from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Eligibility {
    /// Visible to the application but never invocable remotely.
    NotRemote,
    #[default]
    Everywhere,
    /// Only callable from applications with one of these names.
    Only(Vec<String>),
}

impl Eligibility {
    #[must_use]
    pub fn permits(&self, application: &str) -> bool {
        match self {
            Eligibility::NotRemote => false,
            Eligibility::Everywhere => true,
            Eligibility::Only(contexts) => contexts.iter().any(|context| context == application),
        }
    }
}

/// Positional arguments handed to a method body, already coerced to the
/// declared parameter types.
#[derive(Debug)]
pub struct Arguments {
    values: vec::IntoIter<Object>,
}

impl Arguments {
    #[must_use]
    pub fn new(values: Vec<Object>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Takes the next argument. Exhausted arguments read as null.
    pub fn next<V: FromObject>(&mut self) -> Result<V, Fault> {
        let value = self.values.next().unwrap_or(Object::Null);
        Ok(V::from_object(value)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }
}

/// A method exposed on a remote type.
#[derive(Clone)]
pub struct RemoteMethod {
    name: String,
    is_static: bool,
    parameters: Vec<TypeRef>,
    eligibility: Eligibility,
    handler: Handler,
}

impl RemoteMethod {
    /// Declares a method invoked on a target of type `T`.
    ///
    /// The body may mutate the target; callers observe the result only.
    pub fn instance<T, R, F>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = TypeRef>,
        body: F,
    ) -> Self
    where
        T: Remotable,
        R: IntoObject,
        F: Fn(&mut T, &mut Arguments) -> Result<R, Fault> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |target: Option<&mut dyn Remotable>, mut arguments: Arguments| {
            let target = target
                .and_then(|bean| bean.as_any_mut().downcast_mut::<T>())
                .ok_or(CallError::Target)?;
            Ok(body(target, &mut arguments)?.into_object())
        });
        Self::with_handler(name.into(), false, parameters, handler)
    }

    /// Declares a method that takes no target.
    pub fn static_method<R, F>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = TypeRef>,
        body: F,
    ) -> Self
    where
        R: IntoObject,
        F: Fn(&mut Arguments) -> Result<R, Fault> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |_target: Option<&mut dyn Remotable>, mut arguments: Arguments| {
            Ok(body(&mut arguments)?.into_object())
        });
        Self::with_handler(name.into(), true, parameters, handler)
    }

    fn with_handler(
        name: String,
        is_static: bool,
        parameters: impl IntoIterator<Item = TypeRef>,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            is_static,
            parameters: parameters.into_iter().collect(),
            eligibility: Eligibility::Everywhere,
            handler,
        }
    }

    /// Restricts the method to applications with the given names.
    pub fn only_in<S: Into<String>>(mut self, applications: impl IntoIterator<Item = S>) -> Self {
        self.eligibility = Eligibility::Only(applications.into_iter().map(Into::into).collect());
        self
    }

    /// Keeps the method registered but refuses remote calls to it.
    pub fn not_remote(mut self) -> Self {
        self.eligibility = Eligibility::NotRemote;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub fn parameters(&self) -> &[TypeRef] {
        &self.parameters
    }

    #[must_use]
    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    /// Runs the body against `target`, already narrowed to the declaring type.
    pub(crate) fn call(
        &self,
        target: Option<&mut dyn Remotable>,
        arguments: Vec<Object>,
    ) -> Result<Object, CallError> {
        (self.handler)(target, Arguments::new(arguments))
    }
}

impl fmt::Debug for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMethod")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("parameters", &self.parameters)
            .field("eligibility", &self.eligibility)
            .finish_non_exhaustive()
    }
}

/// A type whose methods may be invoked remotely.
#[derive(Debug)]
pub struct RemoteType {
    name: String,
    descriptor: Option<TypeDescriptor>,
    methods: Vec<RemoteMethod>,
}

impl RemoteType {
    /// A bean type, registered with the codec alongside its methods.
    pub fn new<T: Remotable>(spec: TypeSpec<T>) -> Self {
        Self {
            name: spec.name().to_string(),
            descriptor: Some(spec.into()),
            methods: Vec::new(),
        }
    }

    /// Methods for a type registered separately, or a service exposing only
    /// static methods.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: None,
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: RemoteMethod) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn methods(&self) -> &[RemoteMethod] {
        &self.methods
    }

    pub(crate) fn into_parts(self) -> (String, Option<TypeDescriptor>, Vec<RemoteMethod>) {
        (self.name, self.descriptor, self.methods)
    }
}
