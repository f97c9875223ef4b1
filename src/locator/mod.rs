//! Named-component service locator.
//!
//! A [`ServiceLocator`] keeps its own component definitions and instances,
//! orders bulk registrations by declared `depends_on` edges and delegates
//! class construction to a shared [`Container`]. Components whose class
//! declares the blocking-init capability are initialized one after another by
//! [`load_components`](ServiceLocator::load_components).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::container::Container;
use crate::definition::{Definition, Factory};
use crate::descriptors::ClassDescriptor;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::internal::ResolutionStack;
use crate::observer::{LocatorObserver, Observers};
use crate::value::{Config, Params, Value, CLASS_KEY, DEPENDS_ON_KEY};

mod lifecycle;
pub(crate) mod ordering;

pub use lifecycle::BlockingInit;

/// Default threshold after which a pending init step is reported as slow.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Locator behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Pending init steps running longer than this are reported, not aborted
    pub init_timeout: Duration,
    /// Eagerly instantiate components whose class is marked autoload on `set`
    pub autoload: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        LocatorOptions { init_timeout: DEFAULT_INIT_TIMEOUT, autoload: false }
    }
}

/// Input accepted by [`ServiceLocator::set`].
#[derive(Debug, Clone)]
pub enum Component {
    Definition(Definition),
    /// Config map that must name a class; may list `depends_on`
    Config(Config),
    /// Config map plus constructor params
    WithParams(Config, Params),
    Factory(Factory),
    Object(Instance),
}

impl From<Definition> for Component {
    fn from(definition: Definition) -> Self {
        Component::Definition(definition)
    }
}

impl From<Config> for Component {
    fn from(config: Config) -> Self {
        Component::Config(config)
    }
}

impl From<(Config, Params)> for Component {
    fn from((config, params): (Config, Params)) -> Self {
        Component::WithParams(config, params)
    }
}

impl From<Factory> for Component {
    fn from(factory: Factory) -> Self {
        Component::Factory(factory)
    }
}

impl From<Instance> for Component {
    fn from(instance: Instance) -> Self {
        Component::Object(instance)
    }
}

impl Component {
    fn depends_on(&self) -> Vec<String> {
        match self {
            Component::Definition(definition) => depends_on_of(definition.config()),
            Component::Config(config) | Component::WithParams(config, _) => depends_on_of(config),
            Component::Factory(_) | Component::Object(_) => Vec::new(),
        }
    }

    fn normalize(self, id: &str) -> DiResult<ComponentDefinition> {
        let (mut config, params) = match self {
            Component::Factory(factory) => return Ok(ComponentDefinition::Factory(factory)),
            Component::Object(instance) => return Ok(ComponentDefinition::Object(instance)),
            Component::Definition(definition) => {
                let (_, config, params) = definition.into_parts();
                (config, params)
            }
            Component::Config(config) => (config, Params::new()),
            Component::WithParams(config, params) => (config, params),
        };

        let depends_on = depends_on_of(&config);
        config.remove(DEPENDS_ON_KEY);
        let class = match config.remove(CLASS_KEY) {
            Some(Value::String(class)) if !class.is_empty() => class,
            Some(other) => {
                return Err(DiError::invalid(format!(
                    "The \"class\" member of component \"{}\" must be a non-empty string, found {}",
                    id,
                    other.kind()
                )))
            }
            None => {
                return Err(DiError::invalid(format!(
                    "The configuration for the \"{}\" component must contain a \"class\" element",
                    id
                )))
            }
        };
        Ok(ComponentDefinition::Class { class, properties: config, params, depends_on })
    }
}

fn depends_on_of(config: &Config) -> Vec<String> {
    match config.get(DEPENDS_ON_KEY) {
        Some(Value::List(items)) => items.iter().filter_map(|v| v.as_str().ok()).map(str::to_string).collect(),
        Some(Value::String(id)) => vec![id.clone()],
        _ => Vec::new(),
    }
}

/// Normalized component definition.
#[derive(Debug, Clone)]
pub enum ComponentDefinition {
    /// Class-based component: construction is delegated to the container
    Class {
        class: String,
        properties: Config,
        params: Params,
        depends_on: Vec<String>,
    },
    Factory(Factory),
    Object(Instance),
}

impl ComponentDefinition {
    /// Target class of a class-based component.
    pub fn class(&self) -> Option<&str> {
        match self {
            ComponentDefinition::Class { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn depends_on(&self) -> &[String] {
        match self {
            ComponentDefinition::Class { depends_on, .. } => depends_on,
            _ => &[],
        }
    }
}

/// Initialization state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Unregistered,
    Defined,
    Instantiated,
    Initializing,
    Initialized,
    /// The init step failed; load sequencing treated it as done
    FailedButTreatedInitialized,
}

/// Snapshot returned by [`ServiceLocator::get_components`].
#[derive(Debug, Clone)]
pub enum Components {
    Definitions(Vec<(String, ComponentDefinition)>),
    Instances(Vec<(String, Instance)>),
}

/// Layered named-component registry backed by a shared [`Container`].
///
/// # Examples
///
/// ```
/// use ferrous_wire::{config, Class, ClassCatalog, Component, Container, Definition, ServiceLocator};
/// use std::rc::Rc;
///
/// struct Log { level: String }
/// struct Mailer;
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(
///     Class::<Log>::new("app::Log")
///         .param_default("level", "info")
///         .constructor(|args| Ok(Log { level: args.string("level")? })),
/// );
/// catalog.register(Class::<Mailer>::new("app::Mailer").constructor(|_| Ok(Mailer)));
///
/// let locator = ServiceLocator::new(Rc::new(Container::new(catalog)));
/// let components: Vec<(&str, Component)> = vec![
///     ("mailer", Definition::new("mailer").class("app::Mailer").depends_on(["log"]).into()),
///     ("log", config! { "class" => "app::Log" }.into()),
/// ];
/// locator.set_components(components).unwrap();
///
/// assert_eq!(locator.ids(), vec!["log", "mailer"]);
/// let log = locator.get_as::<Log>("log").unwrap();
/// assert_eq!(log.level, "info");
/// assert!(locator.get("missing", false).unwrap().is_none());
/// ```
pub struct ServiceLocator {
    container: Rc<Container>,
    options: LocatorOptions,
    definitions: RefCell<HashMap<String, ComponentDefinition>>,
    order: RefCell<Vec<String>>,
    instances: RefCell<HashMap<String, Instance>>,
    states: RefCell<HashMap<String, ComponentState>>,
    resolving: ResolutionStack,
    observers: RefCell<Observers>,
}

/// What `set` replaced, kept to undo a failed autoload.
struct Previous {
    definition: Option<ComponentDefinition>,
    instance: Option<Instance>,
    state: Option<ComponentState>,
}

enum DeclaredClass {
    Known(Option<Rc<ClassDescriptor>>),
    AfterBuild,
}

impl ServiceLocator {
    pub fn new(container: Rc<Container>) -> Self {
        Self::with_options(container, LocatorOptions::default())
    }

    pub fn with_options(container: Rc<Container>, options: LocatorOptions) -> Self {
        ServiceLocator {
            container,
            options,
            definitions: RefCell::new(HashMap::new()),
            order: RefCell::new(Vec::new()),
            instances: RefCell::new(HashMap::new()),
            states: RefCell::new(HashMap::new()),
            resolving: ResolutionStack::default(),
            observers: RefCell::new(Observers::default()),
        }
    }

    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    pub fn add_observer(&self, observer: Rc<dyn LocatorObserver>) {
        self.observers.borrow_mut().add(observer);
    }

    /// Copy of the registered observers, released from the registry borrow so
    /// callbacks may register further observers. `None` when there are none.
    pub(crate) fn observer_snapshot(&self) -> Option<Observers> {
        let observers = self.observers.borrow();
        observers.has_observers().then(|| observers.clone())
    }

    // ----- Registration -----

    /// Registers `component` under `id`, or removes the definition when
    /// `component` is `None`.
    ///
    /// Any cached instance for `id` is dropped. With autoload enabled, a
    /// component whose class is marked autoload is instantiated immediately.
    pub fn set(&self, id: &str, component: Option<Component>) -> DiResult<()> {
        let Some(component) = component else {
            self.remove(id);
            return Ok(());
        };

        let definition = component.normalize(id)?;
        tracing::debug!(id, class = definition.class(), "registering component");
        let previous = Previous {
            definition: self.definitions.borrow_mut().insert(id.to_string(), definition),
            instance: self.instances.borrow_mut().remove(id),
            state: self.states.borrow_mut().insert(id.to_string(), ComponentState::Defined),
        };
        if previous.definition.is_none() {
            self.order.borrow_mut().push(id.to_string());
        }

        if self.options.autoload {
            if let Err(err) = self.autoload(id) {
                tracing::debug!(id, error = %err, "autoload failed, restoring previous registration");
                self.restore(id, previous);
                return Err(err);
            }
        }
        Ok(())
    }

    fn autoload(&self, id: &str) -> DiResult<()> {
        if self.is_autoload(id)? {
            tracing::debug!(id, "autoloading component");
            self.get_required(id)?;
        }
        Ok(())
    }

    fn remove(&self, id: &str) {
        tracing::debug!(id, "removing component definition");
        self.definitions.borrow_mut().remove(id);
        self.order.borrow_mut().retain(|existing| existing != id);
        self.instances.borrow_mut().remove(id);
        self.states.borrow_mut().remove(id);
    }

    /// Puts back what `set` replaced for `id`.
    fn restore(&self, id: &str, previous: Previous) {
        let Some(definition) = previous.definition else {
            self.remove(id);
            return;
        };
        self.definitions.borrow_mut().insert(id.to_string(), definition);
        match previous.instance {
            Some(instance) => self.instances.borrow_mut().insert(id.to_string(), instance),
            None => self.instances.borrow_mut().remove(id),
        };
        match previous.state {
            Some(state) => self.states.borrow_mut().insert(id.to_string(), state),
            None => self.states.borrow_mut().remove(id),
        };
    }

    /// Registers `components` after ordering them so every component follows
    /// the components it declares in `depends_on`.
    ///
    /// A circular declaration fails with [`DiError::InvalidConfig`] before any
    /// component of the batch is registered.
    pub fn set_components<I, S>(&self, components: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Component)>,
        S: Into<String>,
    {
        let entries: Vec<(String, Component)> = components.into_iter().map(|(id, c)| (id.into(), c)).collect();
        let ordered = ordering::order_by_dependencies(entries, Component::depends_on)?;
        for (id, component) in ordered {
            self.set(&id, Some(component))?;
        }
        Ok(())
    }

    /// Removes the definition and cached instance of `id`.
    pub fn clear(&self, id: &str) {
        self.remove(id);
    }

    // ----- Lookup -----

    /// Returns true if `id` has a definition, or with `check_instance` a
    /// cached instance.
    pub fn has(&self, id: &str, check_instance: bool) -> bool {
        if check_instance {
            self.instances.borrow().contains_key(id)
        } else {
            self.definitions.borrow().contains_key(id)
        }
    }

    /// Returns the component instance, building and caching it on first use.
    ///
    /// Unknown ids fail with [`DiError::NotFound`] when `throw_on_missing` is
    /// set and return `Ok(None)` otherwise.
    pub fn get(&self, id: &str, throw_on_missing: bool) -> DiResult<Option<Instance>> {
        if let Some(instance) = self.instances.borrow().get(id).cloned() {
            return Ok(Some(instance));
        }

        let definition = self.definitions.borrow().get(id).cloned();
        let Some(definition) = definition else {
            if throw_on_missing {
                return Err(DiError::NotFound(id.to_string()));
            }
            return Ok(None);
        };

        let instance = {
            let _guard = self.resolving.enter(id)?;
            self.build(&definition)?
        };
        tracing::debug!(id, "component instantiated");
        self.instances.borrow_mut().insert(id.to_string(), instance.clone());
        self.states.borrow_mut().insert(id.to_string(), ComponentState::Instantiated);
        Ok(Some(instance))
    }

    /// [`get`](Self::get) that fails on unknown ids.
    pub fn get_required(&self, id: &str) -> DiResult<Instance> {
        self.get(id, true)?.ok_or_else(|| DiError::NotFound(id.to_string()))
    }

    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> DiResult<Arc<T>> {
        self.get_required(id)?.downcast::<T>()
    }

    fn build(&self, definition: &ComponentDefinition) -> DiResult<Instance> {
        match definition {
            ComponentDefinition::Object(instance) => Ok(instance.clone()),
            ComponentDefinition::Factory(factory) => factory.call(&self.container, &Params::new(), &Config::new()),
            ComponentDefinition::Class { class, properties, params, .. } => {
                let mut params = params.clone();
                for value in params.values_mut() {
                    let resolved = self.resolve_local(std::mem::replace(value, Value::Null))?;
                    *value = resolved;
                }
                let properties = properties
                    .iter()
                    .map(|(key, value)| self.resolve_local(value.clone()).map(|value| (key.clone(), value)))
                    .collect::<DiResult<Config>>()?;
                self.container.get_with(class, &params, &properties)
            }
        }
    }

    /// Resolves references against this locator's components first, then the
    /// container.
    fn resolve_local(&self, value: Value) -> DiResult<Value> {
        match value {
            Value::Reference(id) if self.has(&id, false) || self.has(&id, true) => {
                self.get_required(&id).map(Value::Object)
            }
            Value::List(items) => items
                .into_iter()
                .map(|item| self.resolve_local(item))
                .collect::<DiResult<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| self.resolve_local(value).map(|value| (key, value)))
                .collect::<DiResult<Config>>()
                .map(Value::Map),
            other => self.container.resolve_value(other),
        }
    }

    /// Descriptor of the class a component resolves to. Components whose class
    /// is only known from the built object (factories, container aliases ending
    /// at a factory) are built.
    pub(crate) fn descriptor_for(&self, id: &str) -> DiResult<Option<Rc<ClassDescriptor>>> {
        let definition = self.definitions.borrow().get(id).cloned();
        let Some(definition) = definition else {
            return Ok(None);
        };
        match self.declared_class(&definition)? {
            DeclaredClass::Known(descriptor) => Ok(descriptor),
            DeclaredClass::AfterBuild => Ok(self.container.catalog().descriptor_of(&self.get_required(id)?)),
        }
    }

    fn declared_class(&self, definition: &ComponentDefinition) -> DiResult<DeclaredClass> {
        let catalog = self.container.catalog();
        match definition {
            ComponentDefinition::Object(instance) => Ok(DeclaredClass::Known(catalog.descriptor_of(instance))),
            ComponentDefinition::Factory(_) => Ok(DeclaredClass::AfterBuild),
            ComponentDefinition::Class { class, .. } => match self.container.class_name_of(class)? {
                Some(resolved) => Ok(DeclaredClass::Known(catalog.get(&resolved))),
                None => Ok(DeclaredClass::AfterBuild),
            },
        }
    }

    /// Autoload never builds a component just to learn its class.
    fn is_autoload(&self, id: &str) -> DiResult<bool> {
        let definition = self.definitions.borrow().get(id).cloned();
        let Some(definition) = definition else {
            return Ok(false);
        };
        match self.declared_class(&definition)? {
            DeclaredClass::Known(descriptor) => Ok(descriptor.map(|d| d.is_autoload()).unwrap_or(false)),
            DeclaredClass::AfterBuild => Ok(false),
        }
    }

    // ----- Introspection -----

    /// Definitions or instances, in registration order.
    pub fn get_components(&self, return_definitions: bool) -> Components {
        if return_definitions {
            Components::Definitions(self.definitions())
        } else {
            Components::Instances(self.instances())
        }
    }

    /// Snapshot of the definitions in registration order.
    pub fn definitions(&self) -> Vec<(String, ComponentDefinition)> {
        let definitions = self.definitions.borrow();
        self.order
            .borrow()
            .iter()
            .filter_map(|id| definitions.get(id).map(|d| (id.clone(), d.clone())))
            .collect()
    }

    /// Snapshot of the instantiated components in registration order.
    pub fn instances(&self) -> Vec<(String, Instance)> {
        let instances = self.instances.borrow();
        self.order
            .borrow()
            .iter()
            .filter_map(|id| instances.get(id).map(|i| (id.clone(), i.clone())))
            .collect()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.order.borrow().clone()
    }

    pub fn state(&self, id: &str) -> ComponentState {
        self.states.borrow().get(id).copied().unwrap_or(ComponentState::Unregistered)
    }

    pub(crate) fn set_state(&self, id: &str, state: ComponentState) {
        self.states.borrow_mut().insert(id.to_string(), state);
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("components", &self.order.borrow())
            .field("instances", &self.instances.borrow().len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use crate::config;

    fn locator() -> ServiceLocator {
        ServiceLocator::new(Rc::new(Container::new(Rc::new(ClassCatalog::new()))))
    }

    #[test]
    fn test_config_without_class_is_rejected() {
        let locator = locator();
        let err = locator.set("db", Some(config! { "dsn" => "x" }.into())).unwrap_err();
        assert!(err.is_invalid_config());
        assert_eq!(locator.state("db"), ComponentState::Unregistered);
    }

    #[test]
    fn test_depends_on_is_stripped_from_properties() {
        let locator = locator();
        locator
            .set("a", Some(config! { "class" => "app::A", "depends_on" => vec!["b"], "x" => 1 }.into()))
            .unwrap();
        let definitions = locator.definitions();
        match &definitions[0].1 {
            ComponentDefinition::Class { class, properties, depends_on, .. } => {
                assert_eq!(class, "app::A");
                assert_eq!(depends_on, &vec!["b".to_string()]);
                assert!(!properties.contains_key("depends_on"));
                assert!(properties.contains_key("x"));
            }
            other => panic!("unexpected definition {:?}", other),
        }
    }

    #[test]
    fn test_reregistering_keeps_position_and_drops_instance() {
        let locator = locator();
        locator.set("a", Some(Instance::new(1u8).into())).unwrap();
        locator.set("b", Some(Instance::new(2u8).into())).unwrap();
        locator.get_required("a").unwrap();
        assert!(locator.has("a", true));

        locator.set("a", Some(Instance::new(3u8).into())).unwrap();
        assert!(!locator.has("a", true));
        assert_eq!(locator.ids(), vec!["a", "b"]);
        assert_eq!(*locator.get_as::<u8>("a").unwrap(), 3);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let locator = locator();
        locator
            .set("loop", Some(config! { "class" => "app::Node", "next" => Value::reference("loop") }.into()))
            .unwrap();
        let err = locator.get_required("loop").unwrap_err();
        assert!(err.is_invalid_config());
    }
}
