//! Definition registry and resolver.
//!
//! The [`Container`] stores one [`Registration`] per identifier, resolves
//! identifiers through alias chains down to a concrete class, binds constructor
//! parameters from caller params, config entries, typed dependencies and
//! defaults, and caches instances of identifiers registered as singletons.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use crate::catalog::ClassCatalog;
use crate::definition::Definition;
use crate::descriptors::{Args, Callable, ClassDescriptor, ClassKind};
use crate::error::{DiError, DiResult};
use crate::inject::Injector;
use crate::instance::Instance;
use crate::internal::ResolutionStack;
use crate::lifetime::Lifetime;
use crate::registration::Registration;
use crate::value::{merge_config, Config, Params, Value};

pub(crate) mod binding;

/// Definition registry plus resolver.
///
/// All operations take `&self`; registries live in `RefCell`s because the
/// container is meant to be driven from a single thread, with construction
/// callbacks free to call back into it.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Class, ClassCatalog, ClassDescriptor, Container, Instance, Registration};
/// use std::rc::Rc;
/// use std::sync::Arc;
///
/// struct FileCache;
/// struct Repository { cache: Arc<FileCache> }
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(ClassDescriptor::interface("app::CacheInterface"));
/// catalog.register(
///     Class::<FileCache>::new("app::FileCache")
///         .implements("app::CacheInterface")
///         .constructor(|_| Ok(FileCache)),
/// );
/// catalog.register(
///     Class::<Repository>::new("app::Repository")
///         .dependency("cache", "app::CacheInterface")
///         .constructor(|args| Ok(Repository { cache: args.object::<FileCache>("cache")? })),
/// );
///
/// let container = Container::new(catalog);
/// // Bind the interface to an implementation, shared as a singleton
/// container
///     .set_singleton("app::CacheInterface", Registration::class("app::FileCache"), Default::default())
///     .unwrap();
///
/// let a = container.get_as::<Repository>("app::Repository").unwrap();
/// let b = container.get_as::<Repository>("app::Repository").unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.cache, &b.cache));
/// ```
pub struct Container {
    catalog: Rc<ClassCatalog>,
    definitions: RefCell<HashMap<String, Registration>>,
    params: RefCell<HashMap<String, Params>>,
    singletons: RefCell<HashSet<String>>,
    instances: RefCell<HashMap<String, Instance>>,
    building: ResolutionStack,
}

impl Container {
    /// Creates an empty container backed by `catalog`.
    pub fn new(catalog: Rc<ClassCatalog>) -> Self {
        Container {
            catalog,
            definitions: RefCell::new(HashMap::new()),
            params: RefCell::new(HashMap::new()),
            singletons: RefCell::new(HashSet::new()),
            instances: RefCell::new(HashMap::new()),
            building: ResolutionStack::default(),
        }
    }

    pub fn catalog(&self) -> &Rc<ClassCatalog> {
        &self.catalog
    }

    /// An [`Injector`] sharing this container's catalog.
    pub fn injector(&self) -> Injector {
        Injector::new(self.catalog.clone())
    }

    // ----- Registration -----

    /// Registers a transient definition for `id`.
    ///
    /// Any cached instance for `id` is dropped and its singleton flag cleared.
    /// Fails with [`DiError::InvalidConfig`] if `definition` is a config map
    /// without a `class` member.
    pub fn set(&self, id: &str, definition: impl Into<Registration>, params: Params) -> DiResult<&Self> {
        self.register(id, definition.into(), params, Lifetime::Transient)?;
        Ok(self)
    }

    /// Registers a singleton definition for `id`.
    pub fn set_singleton(
        &self,
        id: &str,
        definition: impl Into<Registration>,
        params: Params,
    ) -> DiResult<&Self> {
        self.register(id, definition.into(), params, Lifetime::Singleton)?;
        Ok(self)
    }

    /// Registers a [`Definition`] under its own identifier.
    pub fn set_definition(&self, definition: Definition) -> DiResult<&Self> {
        let (id, config, params) = definition.into_parts();
        self.register(&id, Registration::Config(config), params, Lifetime::Transient)?;
        Ok(self)
    }

    /// Registers a [`Definition`] under its own identifier as a singleton.
    pub fn set_singleton_definition(&self, definition: Definition) -> DiResult<&Self> {
        let (id, config, params) = definition.into_parts();
        self.register(&id, Registration::Config(config), params, Lifetime::Singleton)?;
        Ok(self)
    }

    /// Registers several transient definitions, stopping at the first invalid one.
    pub fn set_definitions<I, S, R>(&self, definitions: I) -> DiResult<&Self>
    where
        I: IntoIterator<Item = (S, R)>,
        S: AsRef<str>,
        R: Into<Registration>,
    {
        for (id, definition) in definitions {
            self.set(id.as_ref(), definition, Params::new())?;
        }
        Ok(self)
    }

    /// Registers several singleton definitions, stopping at the first invalid one.
    pub fn set_singletons<I, S, R>(&self, definitions: I) -> DiResult<&Self>
    where
        I: IntoIterator<Item = (S, R)>,
        S: AsRef<str>,
        R: Into<Registration>,
    {
        for (id, definition) in definitions {
            self.set_singleton(id.as_ref(), definition, Params::new())?;
        }
        Ok(self)
    }

    fn register(&self, id: &str, definition: Registration, params: Params, lifetime: Lifetime) -> DiResult<()> {
        let definition = definition.normalize(id)?;
        tracing::debug!(id, ?lifetime, class = definition.class_name(), "registering definition");

        self.definitions.borrow_mut().insert(id.to_string(), definition);
        if params.is_empty() {
            self.params.borrow_mut().remove(id);
        } else {
            self.params.borrow_mut().insert(id.to_string(), params);
        }
        self.instances.borrow_mut().remove(id);
        match lifetime {
            Lifetime::Singleton => self.singletons.borrow_mut().insert(id.to_string()),
            Lifetime::Transient => self.singletons.borrow_mut().remove(id),
        };
        Ok(())
    }

    /// Removes the definition, params, cached instance and singleton flag of `id`.
    pub fn clear(&self, id: &str) {
        tracing::debug!(id, "clearing definition");
        self.definitions.borrow_mut().remove(id);
        self.params.borrow_mut().remove(id);
        self.instances.borrow_mut().remove(id);
        self.singletons.borrow_mut().remove(id);
    }

    // ----- Introspection -----

    /// Returns true if `id` has a registered definition.
    pub fn has(&self, id: &str) -> bool {
        self.definitions.borrow().contains_key(id)
    }

    /// Returns true if `id` is registered as a singleton; with `check_instance`
    /// it must also have been instantiated already.
    pub fn has_singleton(&self, id: &str, check_instance: bool) -> bool {
        if check_instance {
            self.instances.borrow().contains_key(id)
        } else {
            self.singletons.borrow().contains(id)
        }
    }

    /// Lifetime of a registered identifier.
    pub fn lifetime(&self, id: &str) -> Option<Lifetime> {
        if !self.has(id) {
            return None;
        }
        if self.singletons.borrow().contains(id) {
            Some(Lifetime::Singleton)
        } else {
            Some(Lifetime::Transient)
        }
    }

    /// Snapshot of all registered definitions.
    pub fn definitions(&self) -> HashMap<String, Registration> {
        self.definitions.borrow().clone()
    }

    /// Registered constructor params of `id`.
    pub fn params_of(&self, id: &str) -> Params {
        self.params.borrow().get(id).cloned().unwrap_or_default()
    }

    // ----- Resolution -----

    /// Returns the instance for `id`.
    ///
    /// Cached singletons are returned unchanged. Otherwise the definition is
    /// resolved and built, then cached if `id` is a singleton. Identifiers
    /// with no definition are treated as class names.
    pub fn get(&self, id: &str) -> DiResult<Instance> {
        self.get_with(id, &Params::new(), &Config::new())
    }

    /// [`get`](Self::get) with caller-supplied params and config overrides.
    pub fn get_with(&self, id: &str, params: &Params, config: &Config) -> DiResult<Instance> {
        self.resolve_chain(id, params, config, Lookup::Cached)
    }

    /// Resolves `id` and downcasts to the concrete type.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> DiResult<Arc<T>> {
        self.get(id)?.downcast::<T>()
    }

    /// Resolves `id` and views it through a trait-object capability.
    pub fn get_capability<D: ?Sized + 'static>(&self, id: &str) -> DiResult<Arc<D>> {
        let instance = self.get(id)?;
        self.catalog.cast::<D>(&instance)
    }

    /// Builds a new object for `class` without consulting or filling the
    /// singleton cache of `class` itself.
    ///
    /// Fails with [`DiError::NotInstantiable`] when resolution ends at an
    /// interface or abstract class, or at a class with no metadata, and with
    /// [`DiError::InvalidConfig`] for alias cycles and unresolvable parameters.
    pub fn create(&self, class: &str, params: Params, config: Config) -> DiResult<Instance> {
        self.resolve_chain(class, &params, &config, Lookup::Fresh)
    }

    fn cached(&self, id: &str) -> Option<Instance> {
        self.instances.borrow().get(id).cloned()
    }

    /// Follows the alias chain from `id` in a loop, folding each hop's
    /// registered params and properties under what the caller supplied, then
    /// builds once at the terminal entry. Every singleton hop on the way
    /// caches the result.
    fn resolve_chain(&self, id: &str, params: &Params, config: &Config, lookup: Lookup) -> DiResult<Instance> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = Vec::new();
        let mut singleton_hops: Vec<String> = Vec::new();
        let mut params = params.clone();
        let mut config = config.clone();
        let mut current = id.to_string();
        let mut fresh = lookup == Lookup::Fresh;

        let built = loop {
            if !fresh {
                if let Some(instance) = self.cached(&current) {
                    break Ok(instance);
                }
                if self.singletons.borrow().contains(&current) {
                    singleton_hops.push(current.clone());
                }
            }
            fresh = false;

            if !visited.insert(current.clone()) {
                return Err(alias_cycle(&path, &current));
            }

            let entry = self.definitions.borrow().get(&current).cloned();
            if let Some(registered) = self.params.borrow().get(&current) {
                params = registered.merged_with(&params);
            }

            match entry {
                None => break self.build_class(&current, &params, config),
                Some(Registration::Object(instance)) => break Ok(instance),
                Some(Registration::Factory(factory)) => break factory.call(self, &params, &config),
                Some(definition @ Registration::Config(_)) => {
                    config = merge_config(&definition.properties(), &config);
                    match definition.class_name() {
                        Some(class) if class != current => {
                            tracing::trace!(id = %current, target = %class, "following alias");
                            let next = class.to_string();
                            path.push(std::mem::replace(&mut current, next));
                        }
                        _ => break self.build_class(&current, &params, config),
                    }
                }
            }
        };

        let instance = built?;
        if !singleton_hops.is_empty() {
            tracing::debug!(ids = ?singleton_hops, "caching singleton instance");
            let mut instances = self.instances.borrow_mut();
            for hop in singleton_hops {
                instances.insert(hop, instance.clone());
            }
        }
        Ok(instance)
    }

    fn build_class(&self, class: &str, params: &Params, mut config: Config) -> DiResult<Instance> {
        let descriptor = self.instantiable(class)?;
        let _guard = self.building.enter(class)?;

        let values = binding::bind_params(self, class, descriptor.params(), params, Some(&mut config))?;
        let properties = self.resolve_config(config)?;

        let construct = descriptor.construct.clone().ok_or_else(|| no_constructor(class))?;
        let mut args = Args::new(class, values, &self.catalog);
        let instance = construct(&mut args, properties)?;
        tracing::trace!(class, "constructed instance");
        Ok(instance)
    }

    /// Descriptor of `class` if it can be constructed.
    fn instantiable(&self, class: &str) -> DiResult<Rc<ClassDescriptor>> {
        let descriptor = self.catalog.get(class).ok_or_else(|| {
            DiError::not_instantiable(format!("No class metadata registered for \"{}\"", class))
        })?;
        match descriptor.kind() {
            ClassKind::Interface => Err(DiError::not_instantiable(format!(
                "Can not instantiate interface \"{}\": no implementation is registered",
                class
            ))),
            ClassKind::Abstract => Err(DiError::not_instantiable(format!(
                "Can not instantiate abstract class \"{}\": no implementation is registered",
                class
            ))),
            ClassKind::Concrete if descriptor.construct.is_none() => Err(no_constructor(class)),
            ClassKind::Concrete => Ok(descriptor),
        }
    }

    /// Resolves [`Value::Reference`]s (recursively inside lists and maps)
    /// through the container.
    pub fn resolve_value(&self, value: Value) -> DiResult<Value> {
        match value {
            Value::Reference(id) => self.get(&id).map(Value::Object),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.resolve_value(item))
                .collect::<DiResult<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => self.resolve_config(map).map(Value::Map),
            other => Ok(other),
        }
    }

    fn resolve_config(&self, config: Config) -> DiResult<Config> {
        config
            .into_iter()
            .map(|(key, value)| self.resolve_value(value).map(|value| (key, value)))
            .collect()
    }

    /// Walks the alias chain starting at `definition` (registered for
    /// `parent`, if any) down to a literal class name.
    ///
    /// Returns `None` when the chain ends at a factory or pre-built object.
    /// Alias cycles fail with [`DiError::InvalidConfig`]. This is a pure name
    /// lookup: the class is not required to be constructable.
    ///
    /// ```rust
    /// use ferrous_wire::{ClassCatalog, Container, Instance, Registration};
    /// use std::rc::Rc;
    ///
    /// let container = Container::new(Rc::new(ClassCatalog::new()));
    /// container.set("cache", "app::FileCache", Default::default()).unwrap();
    /// container.set("app::FileCache", "app::RedisCache", Default::default()).unwrap();
    /// container.set("clock", Instance::new(0u64), Default::default()).unwrap();
    ///
    /// let cache = Registration::class("cache");
    /// assert_eq!(container.resolve_class_name(&cache, None).unwrap().as_deref(), Some("app::RedisCache"));
    /// assert_eq!(container.resolve_class_name(&Registration::class("clock"), None).unwrap(), None);
    /// ```
    pub fn resolve_class_name(&self, definition: &Registration, parent: Option<&str>) -> DiResult<Option<String>> {
        match definition {
            Registration::Object(_) | Registration::Factory(_) => Ok(None),
            Registration::Config(_) => {
                let class = match (definition.class_name(), parent) {
                    (Some(class), _) => class,
                    (None, Some(parent)) => parent,
                    (None, None) => {
                        return Err(DiError::invalid("A class definition requires a \"class\" member"))
                    }
                };
                if Some(class) == parent {
                    return Ok(Some(class.to_string()));
                }
                self.walk_class_name(class, parent)
            }
        }
    }

    /// [`resolve_class_name`](Self::resolve_class_name) for a registered (or
    /// literal) identifier.
    pub fn class_name_of(&self, id: &str) -> DiResult<Option<String>> {
        self.walk_class_name(id, None)
    }

    /// Like [`class_name_of`](Self::class_name_of) but for construction: a chain
    /// ending at an interface or abstract class fails with
    /// [`DiError::NotInstantiable`].
    pub fn resolve_instantiable_class(&self, id: &str) -> DiResult<Option<String>> {
        match self.walk_class_name(id, None)? {
            Some(class) => self.instantiable(&class).map(|_| Some(class)),
            None => Ok(None),
        }
    }

    fn walk_class_name(&self, start: &str, parent: Option<&str>) -> DiResult<Option<String>> {
        let mut path: Vec<String> = parent.map(|p| vec![p.to_string()]).unwrap_or_default();
        let mut visited: HashSet<String> = path.iter().cloned().collect();
        let mut current = start.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return Err(alias_cycle(&path, &current));
            }
            let entry = self.definitions.borrow().get(&current).cloned();
            let next = match entry {
                None => return Ok(Some(current)),
                Some(Registration::Object(_)) | Some(Registration::Factory(_)) => return Ok(None),
                Some(definition) => match definition.class_name() {
                    Some(class) if class != current => class.to_string(),
                    _ => return Ok(Some(current)),
                },
            };
            path.push(current);
            current = next;
        }
    }

    /// Calls `callable`, binding its parameters like constructor parameters:
    /// named params by name, then positional params by index, then typed
    /// dependencies through the container, then defaults.
    pub fn invoke(&self, callable: &Callable, params: Params) -> DiResult<Value> {
        let values = binding::bind_params(self, callable.name(), callable.params(), &params, None)?;
        let mut args = Args::new(callable.name(), values, &self.catalog);
        callable.call(&mut args)
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut ids: Vec<String> = self.definitions.borrow().keys().cloned().collect();
        ids.sort();
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        for id in ids {
            let lifetime = self.lifetime(&id);
            let cached = self.has_singleton(&id, true);
            let target = match self.definitions.borrow().get(&id) {
                Some(Registration::Config(_)) => self.class_name_of(&id).ok().flatten().unwrap_or_default(),
                Some(Registration::Factory(_)) => "<factory>".to_string(),
                Some(Registration::Object(instance)) => format!("<object {}>", instance.type_name()),
                None => String::new(),
            };
            s.push_str(&format!("  {}: {} {:?} cached={}\n", id, target, lifetime, cached));
        }
        s
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.definitions.borrow().len())
            .field("singletons", &self.singletons.borrow().len())
            .field("instances", &self.instances.borrow().len())
            .finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Consult and fill the cache of the requested id.
    Cached,
    /// Build anew for the requested id; later hops still use their caches.
    Fresh,
}

fn alias_cycle(path: &[String], repeated: &str) -> DiError {
    let mut path = path.to_vec();
    path.push(repeated.to_string());
    DiError::invalid(format!("Circular alias: {}", path.join(" -> ")))
}

fn no_constructor(class: &str) -> DiError {
    DiError::not_instantiable(format!("\"{}\" declares no constructor", class))
}
