//! Class descriptors: explicit construction metadata for constructable types.
//!
//! Rust cannot enumerate a type's constructor parameters at runtime, so every
//! type the container may build is described once, at registration time, by a
//! [`ClassDescriptor`]. The typed [`Class`] builder produces descriptors for
//! concrete types; interfaces and abstract classes are described with
//! [`ClassDescriptor::interface`] and [`ClassDescriptor::abstract_class`].

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::LocalBoxFuture;

use crate::catalog::ClassCatalog;
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::{AnyArc, Instance};
use crate::locator::BlockingInit;
use crate::value::{Config, Value};

pub(crate) type ConstructFn = Rc<dyn Fn(&mut Args<'_>, Config) -> DiResult<Instance>>;
pub(crate) type InitFn = Rc<dyn Fn(Instance) -> LocalBoxFuture<'static, Result<(), BoxError>>>;
pub(crate) type CastFn = Rc<dyn Fn(AnyArc) -> Option<Box<dyn Any>>>;
type CallFn = Rc<dyn Fn(&mut Args<'_>) -> DiResult<Value>>;

/// What a class identifier denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Can be constructed
    Concrete,
    /// Cannot be constructed; needs a registered implementation
    Abstract,
    /// Capability marker; needs a registered implementation
    Interface,
}

/// How a parameter is satisfied when the caller does not supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain value: only caller params, config entries or the default apply
    Value,
    /// Typed dependency resolved through the container by this identifier
    Object(String),
}

/// A declared constructor or callable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required value parameter.
    pub fn value(name: impl Into<String>) -> Self {
        ParamSpec { name: name.into(), kind: ParamKind::Value, default: None }
    }

    /// A typed dependency resolved through the container.
    pub fn object(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        ParamSpec { name: name.into(), kind: ParamKind::Object(type_id.into()), default: None }
    }

    /// Sets the default used when nothing else binds the parameter.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The declared dependency type, if this is a typed parameter.
    pub fn object_type(&self) -> Option<&str> {
        match &self.kind {
            ParamKind::Object(ty) => Some(ty),
            ParamKind::Value => None,
        }
    }
}

pub(crate) struct Caster {
    pub(crate) target: TypeId,
    pub(crate) cast: CastFn,
}

/// Type-erased construction metadata for one class identifier.
pub struct ClassDescriptor {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) supertypes: Vec<String>,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) casters: Vec<Caster>,
    pub(crate) init: Option<InitFn>,
    pub(crate) autoload: bool,
}

impl ClassDescriptor {
    fn bare(name: impl Into<String>, kind: ClassKind) -> Self {
        ClassDescriptor {
            name: name.into(),
            kind,
            type_id: None,
            supertypes: Vec::new(),
            params: Vec::new(),
            construct: None,
            casters: Vec::new(),
            init: None,
            autoload: false,
        }
    }

    /// Describes an interface (capability marker).
    ///
    /// ```rust
    /// use ferrous_wire::{ClassDescriptor, ClassKind};
    ///
    /// let logger = ClassDescriptor::interface("app::LoggerInterface");
    /// assert_eq!(logger.kind(), ClassKind::Interface);
    /// assert!(!logger.is_instantiable());
    /// ```
    pub fn interface(name: impl Into<String>) -> Self {
        Self::bare(name, ClassKind::Interface)
    }

    /// Describes an abstract base class.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::bare(name, ClassKind::Abstract)
    }

    /// Declares a base class or interface this type satisfies.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Directly declared base classes and interfaces.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Concrete and constructable.
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete && self.construct.is_some()
    }

    pub fn has_blocking_init(&self) -> bool {
        self.init.is_some()
    }

    pub fn is_autoload(&self) -> bool {
        self.autoload
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("params", &self.params)
            .field("blocking_init", &self.init.is_some())
            .field("autoload", &self.autoload)
            .finish()
    }
}

/// Typed builder for the descriptor of a concrete type `T`.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Class, ClassCatalog, ClassDescriptor, Container, Params, Value};
/// use std::rc::Rc;
/// use std::sync::Arc;
///
/// struct Formatter;
///
/// struct Mailer {
///     host: String,
///     port: i64,
///     timeout: i64,
///     formatter: Arc<Formatter>,
/// }
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(ClassDescriptor::interface("app::FormatterInterface"));
/// catalog.register(
///     Class::<Formatter>::new("app::Formatter")
///         .implements("app::FormatterInterface")
///         .constructor(|_| Ok(Formatter)),
/// );
/// catalog.register(
///     Class::<Mailer>::new("app::Mailer")
///         .param("host")
///         .param_default("port", 25)
///         .dependency("formatter", "app::Formatter")
///         .property("timeout", |m, v| { m.timeout = v.as_i64()?; Ok(()) })
///         .constructor(|args| Ok(Mailer {
///             host: args.string("host")?,
///             port: args.int("port")?,
///             timeout: 30,
///             formatter: args.object::<Formatter>("formatter")?,
///         })),
/// );
///
/// let container = Container::new(catalog);
/// let mailer = container
///     .create("app::Mailer", Params::new().arg("smtp.local"), ferrous_wire::config! { "timeout" => 5 })
///     .unwrap()
///     .downcast::<Mailer>()
///     .unwrap();
/// assert_eq!(mailer.host, "smtp.local");
/// assert_eq!(mailer.port, 25);
/// assert_eq!(mailer.timeout, 5);
/// ```
pub struct Class<T> {
    name: String,
    supertypes: Vec<String>,
    params: Vec<ParamSpec>,
    ctor: Option<Rc<dyn Fn(&mut Args<'_>) -> DiResult<T>>>,
    setters: BTreeMap<String, Rc<dyn Fn(&mut T, Value) -> DiResult<()>>>,
    casters: Vec<Caster>,
    init: Option<InitFn>,
    autoload: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Class<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            name: name.into(),
            supertypes: Vec::new(),
            params: Vec::new(),
            ctor: None,
            setters: BTreeMap::new(),
            casters: Vec::new(),
            init: None,
            autoload: false,
            _marker: PhantomData,
        }
    }

    /// Declares a base class this type extends.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.supertypes.push(base.into());
        self
    }

    /// Declares an interface this type implements.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.supertypes.push(interface.into());
        self
    }

    /// Declares an interface and how to view `T` as the matching trait object,
    /// so dependents can ask for `Arc<D>` through [`Args::capability`].
    pub fn implements_as<D>(mut self, interface: impl Into<String>, cast: fn(Arc<T>) -> Arc<D>) -> Self
    where
        D: ?Sized + 'static,
    {
        self.supertypes.push(interface.into());
        self.casters.push(Caster {
            target: TypeId::of::<D>(),
            cast: Rc::new(move |any: AnyArc| {
                any.downcast::<T>().ok().map(|concrete| Box::new(cast(concrete)) as Box<dyn Any>)
            }),
        });
        self
    }

    /// Required value parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::value(name));
        self
    }

    /// Value parameter with a default.
    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(ParamSpec::value(name).with_default(default));
        self
    }

    /// Typed dependency resolved through the container.
    pub fn dependency(mut self, name: impl Into<String>, type_id: impl Into<String>) -> Self {
        self.params.push(ParamSpec::object(name, type_id));
        self
    }

    /// Typed dependency that falls back to `Value::Null` when it cannot be resolved.
    pub fn optional_dependency(mut self, name: impl Into<String>, type_id: impl Into<String>) -> Self {
        self.params.push(ParamSpec::object(name, type_id).with_default(Value::Null));
        self
    }

    /// Property setter applied for config entries left after constructor binding.
    pub fn property<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Value) -> DiResult<()> + 'static,
    {
        self.setters.insert(name.into(), Rc::new(setter));
        self
    }

    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn(&mut Args<'_>) -> DiResult<T> + 'static,
    {
        self.ctor = Some(Rc::new(ctor));
        self
    }

    /// Marks the class for eager instantiation by autoloading locators.
    pub fn autoload(mut self) -> Self {
        self.autoload = true;
        self
    }

    /// Declares the blocking-init capability: locators run
    /// [`BlockingInit::init`] during `load_components`.
    pub fn blocking_init(mut self) -> Self
    where
        T: BlockingInit,
    {
        self.init = Some(Rc::new(
            |instance: Instance| -> LocalBoxFuture<'static, Result<(), BoxError>> {
                Box::pin(async move {
                    let component = instance.downcast::<T>().map_err(|e| Box::new(e) as BoxError)?;
                    component.init().await
                })
            },
        ));
        self
    }
}

impl<T: Send + Sync + 'static> From<Class<T>> for ClassDescriptor {
    fn from(class: Class<T>) -> Self {
        let Class { name, supertypes, params, ctor, setters, casters, init, autoload, .. } = class;
        let owner = name.clone();
        let construct = ctor.map(|ctor| {
            Rc::new(move |args: &mut Args<'_>, properties: Config| -> DiResult<Instance> {
                let mut value = ctor(args)?;
                for (property, v) in properties {
                    let setter = setters.get(&property).ok_or_else(|| {
                        DiError::invalid(format!("Setting unknown property: {}::{}", owner, property))
                    })?;
                    setter(&mut value, v)?;
                }
                Ok(Instance::new(value))
            }) as ConstructFn
        });
        ClassDescriptor {
            name,
            kind: ClassKind::Concrete,
            type_id: Some(TypeId::of::<T>()),
            supertypes,
            params,
            construct,
            casters,
            init,
            autoload,
        }
    }
}

/// A function whose parameters are bound like a constructor's, for
/// [`Container::invoke`](crate::Container::invoke).
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Callable, ClassCatalog, Container, Params, Value};
/// use std::rc::Rc;
///
/// let container = Container::new(Rc::new(ClassCatalog::new()));
/// let shout = Callable::new("shout", |args| Ok(Value::from(args.string("text")?.to_uppercase())))
///     .param("text");
///
/// let out = container.invoke(&shout, Params::new().named("text", "hi")).unwrap();
/// assert_eq!(out, Value::from("HI"));
/// ```
#[derive(Clone)]
pub struct Callable {
    name: String,
    params: Vec<ParamSpec>,
    body: CallFn,
}

impl Callable {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Args<'_>) -> DiResult<Value> + 'static,
    {
        Callable { name: name.into(), params: Vec::new(), body: Rc::new(body) }
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::value(name));
        self
    }

    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(ParamSpec::value(name).with_default(default));
        self
    }

    pub fn dependency(mut self, name: impl Into<String>, type_id: impl Into<String>) -> Self {
        self.params.push(ParamSpec::object(name, type_id));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn call(&self, args: &mut Args<'_>) -> DiResult<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Bound arguments handed to a constructor or callable body, by parameter name.
pub struct Args<'a> {
    owner: &'a str,
    values: Vec<(String, Value)>,
    catalog: &'a ClassCatalog,
}

impl<'a> Args<'a> {
    pub(crate) fn new(owner: &'a str, values: Vec<(String, Value)>, catalog: &'a ClassCatalog) -> Self {
        Args { owner, values, catalog }
    }

    fn missing(&self, name: &str) -> DiError {
        DiError::invalid(format!("`{}` has no parameter named `{}`", self.owner, name))
    }

    fn context(&self, name: &str, err: DiError) -> DiError {
        match err {
            DiError::TypeMismatch(msg) => {
                DiError::mismatch(format!("parameter `{}` of `{}`: {}", name, self.owner, msg))
            }
            other => other,
        }
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, name: &str) -> DiResult<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| self.missing(name))
    }

    /// Moves the value out, leaving `Value::Null` behind.
    pub fn take(&mut self, name: &str) -> DiResult<Value> {
        let missing = self.missing(name);
        self.values
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| std::mem::replace(v, Value::Null))
            .ok_or(missing)
    }

    pub fn string(&self, name: &str) -> DiResult<String> {
        self.value(name)?.as_str().map(str::to_string).map_err(|e| self.context(name, e))
    }

    pub fn int(&self, name: &str) -> DiResult<i64> {
        self.value(name)?.as_i64().map_err(|e| self.context(name, e))
    }

    pub fn float(&self, name: &str) -> DiResult<f64> {
        self.value(name)?.as_f64().map_err(|e| self.context(name, e))
    }

    pub fn bool(&self, name: &str) -> DiResult<bool> {
        self.value(name)?.as_bool().map_err(|e| self.context(name, e))
    }

    pub fn instance(&self, name: &str) -> DiResult<Instance> {
        self.value(name)?.as_object().cloned().map_err(|e| self.context(name, e))
    }

    /// Concrete object argument.
    pub fn object<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        self.instance(name)?.downcast::<T>().map_err(|e| self.context(name, e))
    }

    /// Object argument or `None` when the parameter was bound to `Value::Null`.
    pub fn optional_object<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        match self.value(name)? {
            Value::Null => Ok(None),
            _ => self.object::<T>(name).map(Some),
        }
    }

    /// Object argument viewed through a trait-object capability.
    pub fn capability<D: ?Sized + 'static>(&self, name: &str) -> DiResult<Arc<D>> {
        let instance = self.instance(name)?;
        self.catalog.cast::<D>(&instance).map_err(|e| self.context(name, e))
    }
}
