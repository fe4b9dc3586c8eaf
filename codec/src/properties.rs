//! Property registry.
//!
//! Types are registered with a [`TypeSpec`] that lists accessor operations in
//! the `getX` / `isX` / `setX` shape. The registry groups them into properties
//! once per type and memoizes the resulting [`PropertyTable`] for the life of
//! the registry.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use courier_types::{
    ConversionError, DATE_TYPE, EnumValue, FromObject, IntoObject, Object, RemoteEnum, Remotable,
    TypeRef,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::coerce::coerce;
use crate::error::{MarshalError, RegistryError};

type ReadFn = Arc<dyn Fn(&dyn Remotable) -> Option<Object> + Send + Sync>;
type WriteFn = Arc<dyn Fn(&mut dyn Remotable, Object) -> Result<(), ConversionError> + Send + Sync>;
type ConstructFn = Arc<dyn Fn() -> Result<Box<dyn Remotable>, String> + Send + Sync>;

/// Properties of one type, keyed by property name.
pub type PropertyTable = BTreeMap<String, PropertyDescriptor>;

/// Operation inherited from the universal base type; never a property.
const BASE_TYPE_GETTER: &str = "getClass";

/// Property every error-shaped type exposes regardless of inclusion flags.
pub const MESSAGE_PROPERTY: &str = "message";

// ============================================================================
// Accessors
// ============================================================================

#[derive(Clone)]
enum AccessorFn {
    Read(ReadFn),
    Write(WriteFn),
}

#[derive(Clone)]
struct Accessor {
    operation: String,
    declared: TypeRef,
    declared_by: String,
    function: AccessorFn,
    include: bool,
    exclude: bool,
    transfer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Read,
    Write,
}

impl Accessor {
    fn role(&self) -> Role {
        match self.function {
            AccessorFn::Read(_) => Role::Read,
            AccessorFn::Write(_) => Role::Write,
        }
    }

    /// Derived property name, or `None` if the operation is not accessor-shaped.
    fn property_name(&self) -> Option<String> {
        let remainder = match self.role() {
            Role::Read if self.operation == BASE_TYPE_GETTER => None,
            Role::Read => self.operation.strip_prefix("get").or_else(|| {
                (self.declared == TypeRef::Bool)
                    .then(|| self.operation.strip_prefix("is"))
                    .flatten()
            }),
            Role::Write => self.operation.strip_prefix("set"),
        }?;
        let mut chars = remainder.chars();
        let first = chars.next()?;
        Some(first.to_lowercase().chain(chars).collect())
    }
}

// ============================================================================
// TypeSpec
// ============================================================================

/// Reaches the parent part of a bean declared with [`TypeSpec::extends`].
trait Upcast: Send + Sync {
    fn upcast<'a>(&self, bean: &'a mut dyn Remotable) -> Option<&'a mut dyn Remotable>;
}

struct Projection<T, P> {
    project_mut: fn(&mut T) -> &mut P,
}

impl<T: Remotable, P: Remotable> Upcast for Projection<T, P> {
    fn upcast<'a>(&self, bean: &'a mut dyn Remotable) -> Option<&'a mut dyn Remotable> {
        let child = bean.as_any_mut().downcast_mut::<T>()?;
        Some((self.project_mut)(child))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
struct TypeFlags {
    include_all: bool,
    exclude_all: bool,
    transferable: bool,
    error_shaped: bool,
    final_type: bool,
}

/// Declarative registration of a bean type `T`.
///
/// ```ignore
/// let spec = TypeSpec::<Address>::new("bank.Address")
///     .include_all()
///     .getter("getCity", TypeRef::Text, |a| a.city.clone())
///     .setter("setCity", TypeRef::Text, |a, city| a.city = city);
/// ```
///
/// Flag modifiers such as [`TypeSpec::exclude`] apply to the accessors added by
/// the preceding `getter`, `setter` or `property` call.
pub struct TypeSpec<T> {
    name: String,
    parent: Option<String>,
    accessors: Vec<Accessor>,
    last_declared: usize,
    flags: TypeFlags,
    constructor: ConstructFn,
    upcast: Option<Arc<dyn Upcast>>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Remotable + Default> TypeSpec<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_constructor(name, || Ok(T::default()))
    }
}

impl<T: Remotable> TypeSpec<T> {
    /// Registers `T` with a fallible constructor in place of `Default`.
    pub fn with_constructor<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parent: None,
            accessors: Vec::new(),
            last_declared: 0,
            flags: TypeFlags::default(),
            constructor: Arc::new(move || {
                constructor().map(|value| Box::new(value) as Box<dyn Remotable>)
            }),
            upcast: None,
            _type: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inherits every accessor of `parent`, reached through the projections.
    ///
    /// Accessors declared afterwards with the same operation name override the
    /// inherited ones.
    pub fn extends<P: Remotable>(
        mut self,
        parent: &TypeSpec<P>,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.parent = Some(parent.name.clone());
        self.upcast = Some(Arc::new(Projection { project_mut }));
        for accessor in &parent.accessors {
            let function = match &accessor.function {
                AccessorFn::Read(read) => {
                    let read = Arc::clone(read);
                    AccessorFn::Read(Arc::new(move |bean: &dyn Remotable| {
                        let child = bean.as_any().downcast_ref::<T>()?;
                        read(project(child) as &dyn Remotable)
                    }))
                }
                AccessorFn::Write(write) => {
                    let write = Arc::clone(write);
                    AccessorFn::Write(Arc::new(move |bean: &mut dyn Remotable, value: Object| {
                        let child = bean
                            .as_any_mut()
                            .downcast_mut::<T>()
                            .ok_or_else(|| ConversionError::new(std::any::type_name::<T>(), "object"))?;
                        write(project_mut(child) as &mut dyn Remotable, value)
                    }))
                }
            };
            self.accessors.push(Accessor {
                function,
                ..accessor.clone()
            });
        }
        self.last_declared = self.accessors.len();
        self
    }

    pub fn getter<V, F>(self, operation: &str, declared: TypeRef, read: F) -> Self
    where
        V: IntoObject,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let function = AccessorFn::Read(Arc::new(move |bean: &dyn Remotable| {
            bean.as_any().downcast_ref::<T>().map(|value| read(value).into_object())
        }));
        let accessor = self.accessor(operation, declared, function);
        self.declare(vec![accessor])
    }

    pub fn setter<V, F>(self, operation: &str, declared: TypeRef, write: F) -> Self
    where
        V: FromObject,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let function = AccessorFn::Write(Self::erase_write(write));
        let accessor = self.accessor(operation, declared, function);
        self.declare(vec![accessor])
    }

    /// Declares a read/write property through a `getX`/`isX` and `setX` pair.
    pub fn property<V, G, S>(self, name: &str, declared: TypeRef, read: G, write: S) -> Self
    where
        V: IntoObject + FromObject,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let capitalized = capitalize(name);
        let prefix = if declared == TypeRef::Bool { "is" } else { "get" };
        let reader = AccessorFn::Read(Arc::new(move |bean: &dyn Remotable| {
            bean.as_any().downcast_ref::<T>().map(|value| read(value).into_object())
        }));
        let writer = AccessorFn::Write(Self::erase_write(write));
        let accessors = vec![
            self.accessor(&format!("{prefix}{capitalized}"), declared.clone(), reader),
            self.accessor(&format!("set{capitalized}"), declared, writer),
        ];
        self.declare(accessors)
    }

    /// Opts the last declared accessors into whitelist encoding.
    pub fn include(mut self) -> Self {
        self.mark(|accessor| accessor.include = true);
        self
    }

    /// Opts the last declared accessors out of blacklist encoding.
    pub fn exclude(mut self) -> Self {
        self.mark(|accessor| accessor.exclude = true);
        self
    }

    pub fn transfer(mut self) -> Self {
        self.mark(|accessor| accessor.transfer = true);
        self
    }

    /// Opts every accessor declared on this type into whitelist encoding.
    pub fn include_all(mut self) -> Self {
        self.flags.include_all = true;
        self
    }

    pub fn exclude_all(mut self) -> Self {
        self.flags.exclude_all = true;
        self
    }

    pub fn transferable(mut self) -> Self {
        self.flags.transferable = true;
        self
    }

    /// Marks the type as an error whose `message` property is always encoded.
    pub fn error_shaped(mut self) -> Self {
        self.flags.error_shaped = true;
        self
    }

    /// Final types are encoded without a type tag.
    pub fn final_type(mut self) -> Self {
        self.flags.final_type = true;
        self
    }

    fn accessor(&self, operation: &str, declared: TypeRef, function: AccessorFn) -> Accessor {
        Accessor {
            operation: operation.to_string(),
            declared,
            declared_by: self.name.clone(),
            function,
            include: false,
            exclude: false,
            transfer: false,
        }
    }

    fn declare(mut self, accessors: Vec<Accessor>) -> Self {
        for accessor in &accessors {
            self.accessors
                .retain(|existing| existing.operation != accessor.operation);
        }
        self.last_declared = self.accessors.len();
        self.accessors.extend(accessors);
        self
    }

    fn mark(&mut self, apply: impl Fn(&mut Accessor)) {
        let start = self.last_declared.min(self.accessors.len());
        self.accessors[start..].iter_mut().for_each(apply);
    }

    fn erase_write<V, F>(write: F) -> WriteFn
    where
        V: FromObject,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Arc::new(move |bean: &mut dyn Remotable, value: Object| {
            let target = bean
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| ConversionError::new(std::any::type_name::<T>(), "object"))?;
            write(target, V::from_object(value)?);
            Ok(())
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A registered type with its Rust type erased.
pub struct TypeDescriptor {
    name: String,
    parent: Option<String>,
    type_id: TypeId,
    rust_type: &'static str,
    accessors: Vec<Accessor>,
    flags: TypeFlags,
    constructor: ConstructFn,
    upcast: Option<Arc<dyn Upcast>>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.final_type
    }

    #[must_use]
    pub fn is_error_shaped(&self) -> bool {
        self.flags.error_shaped
    }
}

impl<T: Remotable> From<TypeSpec<T>> for TypeDescriptor {
    fn from(spec: TypeSpec<T>) -> Self {
        Self {
            name: spec.name,
            parent: spec.parent,
            type_id: TypeId::of::<T>(),
            rust_type: std::any::type_name::<T>(),
            accessors: spec.accessors,
            flags: spec.flags,
            constructor: spec.constructor,
            upcast: spec.upcast,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("rust_type", &self.rust_type)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PropertyDescriptor
// ============================================================================

/// One named property of a bean type. Immutable once computed.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    declared: TypeRef,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
    included: bool,
    excluded: bool,
    transferable: bool,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type: the getter's if there is one, the setter's otherwise.
    #[must_use]
    pub fn declared_type(&self) -> &TypeRef {
        &self.declared
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    #[must_use]
    pub fn is_writeable(&self) -> bool {
        self.write.is_some()
    }

    /// Explicit whitelist opt-in, or the `message` of an error-shaped type.
    #[must_use]
    pub fn is_included(&self) -> bool {
        self.included
    }

    /// Explicit blacklist opt-out, or not readable at all.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    #[must_use]
    pub fn is_transferable(&self) -> bool {
        self.transferable
    }

    /// Reads the property, or `None` if it is write-only or `bean` is of another type.
    #[must_use]
    pub fn read(&self, bean: &dyn Remotable) -> Option<Object> {
        self.read.as_ref().and_then(|read| read(bean))
    }

    pub fn write(&self, bean: &mut dyn Remotable, value: Object) -> Result<(), ConversionError> {
        match &self.write {
            Some(write) => write(bean, value),
            None => Err(ConversionError::new(
                format!("writeable property {}", self.name),
                "read-only property",
            )),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("readable", &self.is_readable())
            .field("writeable", &self.is_writeable())
            .field("included", &self.included)
            .field("excluded", &self.excluded)
            .field("transferable", &self.transferable)
            .finish()
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// A registered enumeration: its name and members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    members: Vec<String>,
}

impl EnumDescriptor {
    #[must_use]
    pub fn of<E: RemoteEnum>() -> Self {
        Self {
            name: E::TYPE_NAME.to_string(),
            members: E::MEMBERS.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Resolves a member by exact name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .position(|member| member == name)
            .map(|ordinal| EnumValue::new(self.name.clone(), name, ordinal))
    }
}

// ============================================================================
// TypeRegistry
// ============================================================================

/// Closed registry of bean and enumeration types.
///
/// Immutable after [`TypeRegistryBuilder::build`] except for the property
/// cache, which fills lazily and is safe to populate from many threads.
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
    names_by_id: HashMap<TypeId, String>,
    enums: HashMap<String, EnumDescriptor>,
    cache: RwLock<HashMap<String, Arc<PropertyTable>>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// Registered bean type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered name of the concrete type of `bean`.
    #[must_use]
    pub fn type_name_of(&self, bean: &dyn Remotable) -> Option<&str> {
        self.names_by_id
            .get(&Any::type_id(bean.as_any()))
            .map(String::as_str)
    }

    /// Whether `name` is `ancestor` or one of its registered subtypes.
    #[must_use]
    pub fn is_assignable(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        while let Some(type_name) = current {
            if type_name == ancestor {
                return true;
            }
            current = self.types.get(type_name).and_then(TypeDescriptor::parent);
        }
        false
    }

    /// The part of `bean` that is an `ancestor`, following the projections
    /// recorded by [`TypeSpec::extends`].
    ///
    /// `None` if `bean` is not `ancestor` or one of its registered subtypes.
    pub fn upcast<'a>(
        &self,
        bean: &'a mut dyn Remotable,
        ancestor: &str,
    ) -> Option<&'a mut dyn Remotable> {
        let actual = self.type_name_of(&*bean)?;
        if actual == ancestor {
            return Some(bean);
        }
        let projection = self.types.get(actual)?.upcast.as_ref()?;
        self.upcast(projection.upcast(bean)?, ancestor)
    }

    /// Whether `value` can be bound to a parameter or property of type `target`.
    #[must_use]
    pub fn accepts(&self, target: &TypeRef, value: &Object) -> bool {
        match (target, value) {
            (TypeRef::Bean(expected), Object::Bean(bean)) => self
                .type_name_of(&**bean)
                .is_some_and(|actual| self.is_assignable(actual, expected)),
            _ => target.matches_shape(value),
        }
    }

    /// Resolves a wire type tag to a declared type.
    pub fn resolve_tag(&self, tag: &str) -> Result<TypeRef, MarshalError> {
        if tag == DATE_TYPE {
            Ok(TypeRef::Date)
        } else if self.types.contains_key(tag) {
            debug!(tag, "Resolved type tag");
            Ok(TypeRef::bean(tag))
        } else {
            Err(MarshalError::UnknownTypeTag {
                tag: tag.to_string(),
            })
        }
    }

    pub fn enum_member(&self, type_name: &str, member: &str) -> Result<EnumValue, MarshalError> {
        let descriptor = self
            .enums
            .get(type_name)
            .ok_or_else(|| MarshalError::UnregisteredType {
                type_name: type_name.to_string(),
            })?;
        descriptor
            .member(member)
            .ok_or_else(|| MarshalError::UnknownEnumMember {
                type_name: type_name.to_string(),
                member: member.to_string(),
            })
    }

    /// Builds a fresh instance of a registered type with its default constructor.
    pub fn construct(&self, name: &str) -> Result<Box<dyn Remotable>, MarshalError> {
        let descriptor = self.require(name)?;
        (descriptor.constructor)().map_err(|reason| MarshalError::Construct {
            type_name: name.to_string(),
            reason,
        })
    }

    /// Properties of a registered type, computed on first use.
    pub fn properties(&self, name: &str) -> Result<Arc<PropertyTable>, MarshalError> {
        if let Some(table) = self.cache.read().get(name) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.compute_table(self.require(name)?));
        let mut cache = self.cache.write();
        let published = cache
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(type_name = name, properties = table.len(), "Cached property table");
                Arc::clone(&table)
            });
        Ok(Arc::clone(published))
    }

    pub fn properties_of(&self, bean: &dyn Remotable) -> Result<Arc<PropertyTable>, MarshalError> {
        let name = self.bean_type_name(bean)?;
        self.properties(name)
    }

    /// Names of the properties marked transferable on the accessor or its type.
    pub fn transferable_properties(&self, name: &str) -> Result<Vec<String>, MarshalError> {
        Ok(self
            .properties(name)?
            .values()
            .filter(|property| property.is_transferable())
            .map(|property| property.name().to_string())
            .collect())
    }

    /// Reads a bean property through its descriptor, or a map entry by key.
    pub fn read_property(&self, object: &Object, property: &str) -> Result<Object, MarshalError> {
        match object {
            Object::Map(entries) => Ok(entries.get(property).cloned().unwrap_or(Object::Null)),
            Object::Bean(bean) => {
                let type_name = self.bean_type_name(&**bean)?;
                self.properties(type_name)?
                    .get(property)
                    .and_then(|descriptor| descriptor.read(&**bean))
                    .ok_or_else(|| MarshalError::UnknownProperty {
                        type_name: type_name.to_string(),
                        property: property.to_string(),
                    })
            }
            other => Err(MarshalError::incompatible(other.kind_name(), "object")),
        }
    }

    /// Writes a bean property through its descriptor after coercing `value` to
    /// the declared type, or inserts a map entry.
    pub fn write_property(
        &self,
        object: &mut Object,
        property: &str,
        value: Object,
    ) -> Result<(), MarshalError> {
        match object {
            Object::Map(entries) => {
                entries.insert(property.to_string(), value);
                Ok(())
            }
            Object::Bean(bean) => {
                let type_name = self.bean_type_name(&**bean)?.to_string();
                let table = self.properties(&type_name)?;
                let descriptor = table
                    .get(property)
                    .filter(|descriptor| descriptor.is_writeable())
                    .ok_or_else(|| MarshalError::UnknownProperty {
                        type_name: type_name.clone(),
                        property: property.to_string(),
                    })?;
                let value = coerce(value, descriptor.declared_type(), self)
                    .map_err(|err| err.in_property(&type_name, property))?;
                descriptor
                    .write(&mut **bean, value)
                    .map_err(|err| MarshalError::from(err).in_property(&type_name, property))
            }
            other => Err(MarshalError::incompatible(other.kind_name(), "object")),
        }
    }

    fn bean_type_name(&self, bean: &dyn Remotable) -> Result<&str, MarshalError> {
        self.type_name_of(bean)
            .ok_or_else(|| MarshalError::UnregisteredType {
                type_name: format!("{bean:?}"),
            })
    }

    fn require(&self, name: &str) -> Result<&TypeDescriptor, MarshalError> {
        self.types
            .get(name)
            .ok_or_else(|| MarshalError::UnregisteredType {
                type_name: name.to_string(),
            })
    }

    fn flags_of(&self, name: &str) -> TypeFlags {
        self.types
            .get(name)
            .map(|descriptor| descriptor.flags)
            .unwrap_or_default()
    }

    fn lineage_is_error_shaped(&self, name: &str) -> bool {
        let mut current = self.types.get(name);
        while let Some(descriptor) = current {
            if descriptor.flags.error_shaped {
                return true;
            }
            current = descriptor.parent().and_then(|parent| self.types.get(parent));
        }
        false
    }

    fn compute_table(&self, descriptor: &TypeDescriptor) -> PropertyTable {
        let mut readers: BTreeMap<String, &Accessor> = BTreeMap::new();
        let mut writers: BTreeMap<String, &Accessor> = BTreeMap::new();
        for accessor in &descriptor.accessors {
            let Some(name) = accessor.property_name() else {
                continue;
            };
            match accessor.role() {
                Role::Read => readers.insert(name, accessor),
                Role::Write => writers.insert(name, accessor),
            };
        }

        let error_shaped = self.lineage_is_error_shaped(&descriptor.name);
        let mut names: Vec<String> = readers.keys().chain(writers.keys()).cloned().collect();
        names.sort_unstable();
        names.dedup();

        names
            .into_iter()
            .filter_map(|name| {
                let reader = readers.get(&name).copied();
                let writer = writers.get(&name).copied();
                let primary = reader.or(writer)?;
                let reader_flags = reader.map(|accessor| self.flags_of(&accessor.declared_by));
                let included = (error_shaped && name == MESSAGE_PROPERTY)
                    || reader.is_some_and(|accessor| accessor.include)
                    || reader_flags.is_some_and(|flags| flags.include_all);
                let excluded = reader.is_none()
                    || reader.is_some_and(|accessor| accessor.exclude)
                    || reader_flags.is_some_and(|flags| flags.exclude_all);
                let transferable = [reader, writer].into_iter().flatten().any(|accessor| {
                    accessor.transfer || self.flags_of(&accessor.declared_by).transferable
                });
                let property = PropertyDescriptor {
                    name: name.clone(),
                    declared: primary.declared.clone(),
                    read: reader.and_then(|accessor| match &accessor.function {
                        AccessorFn::Read(read) => Some(Arc::clone(read)),
                        AccessorFn::Write(_) => None,
                    }),
                    write: writer.and_then(|accessor| match &accessor.function {
                        AccessorFn::Write(write) => Some(Arc::clone(write)),
                        AccessorFn::Read(_) => None,
                    }),
                    included,
                    excluded,
                    transferable,
                };
                Some((name, property))
            })
            .collect()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct TypeRegistryBuilder {
    types: Vec<TypeDescriptor>,
    enums: Vec<EnumDescriptor>,
}

impl TypeRegistryBuilder {
    pub fn register(&mut self, descriptor: impl Into<TypeDescriptor>) -> Result<(), RegistryError> {
        let descriptor = descriptor.into();
        if descriptor.name == DATE_TYPE {
            return Err(RegistryError::ReservedName {
                name: descriptor.name,
            });
        }
        if self.is_taken(&descriptor.name) {
            return Err(RegistryError::DuplicateType {
                name: descriptor.name,
            });
        }
        if let Some(existing) = self
            .types
            .iter()
            .find(|existing| existing.type_id == descriptor.type_id)
        {
            return Err(RegistryError::DuplicateBinding {
                rust_type: descriptor.rust_type,
                first: existing.name.clone(),
                second: descriptor.name,
            });
        }
        self.types.push(descriptor);
        Ok(())
    }

    pub fn register_enum<E: RemoteEnum>(&mut self) -> Result<(), RegistryError> {
        let descriptor = EnumDescriptor::of::<E>();
        if descriptor.name == DATE_TYPE {
            return Err(RegistryError::ReservedName {
                name: descriptor.name,
            });
        }
        if self.is_taken(&descriptor.name) {
            return Err(RegistryError::DuplicateType {
                name: descriptor.name,
            });
        }
        self.enums.push(descriptor);
        Ok(())
    }

    /// Checks parent links and freezes the registry.
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        for descriptor in &self.types {
            if let Some(parent) = descriptor.parent()
                && !self.types.iter().any(|candidate| candidate.name == parent)
            {
                return Err(RegistryError::UnknownParent {
                    name: descriptor.name.clone(),
                    parent: parent.to_string(),
                });
            }
        }
        let names_by_id = self
            .types
            .iter()
            .map(|descriptor| (descriptor.type_id, descriptor.name.clone()))
            .collect();
        Ok(TypeRegistry {
            types: self
                .types
                .into_iter()
                .map(|descriptor| (descriptor.name.clone(), descriptor))
                .collect(),
            names_by_id,
            enums: self
                .enums
                .into_iter()
                .map(|descriptor| (descriptor.name.clone(), descriptor))
                .collect(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn is_taken(&self, name: &str) -> bool {
        self.types.iter().any(|existing| existing.name == name)
            || self.enums.iter().any(|existing| existing.name == name)
    }
}
