//! Definition builder and factory wrapper.

use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::DiResult;
use crate::instance::Instance;
use crate::value::{Config, Params, Value, CLASS_KEY, DEPENDS_ON_KEY};

type FactoryFn = Rc<dyn Fn(&Container, &Params, &Config) -> DiResult<Instance>>;

/// Deferred construction: a callback invoked with the container, the request
/// params and the request config. Its result is returned as-is.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ClassCatalog, Container, Factory, Instance, Registration};
/// use std::rc::Rc;
///
/// struct Connection { dsn: String }
///
/// let container = Container::new(Rc::new(ClassCatalog::new()));
/// let factory = Factory::new(|_container, params, _config| {
///     let dsn = params.get_positional(0).map(|v| v.as_str().map(str::to_string)).transpose()?;
///     Ok(Instance::new(Connection { dsn: dsn.unwrap_or_else(|| "sqlite::memory:".into()) }))
/// });
/// container.set("db", Registration::Factory(factory), Default::default()).unwrap();
///
/// let conn = container.get("db").unwrap().downcast::<Connection>().unwrap();
/// assert_eq!(conn.dsn, "sqlite::memory:");
/// ```
#[derive(Clone)]
pub struct Factory {
    callback: FactoryFn,
}

impl Factory {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Container, &Params, &Config) -> DiResult<Instance> + 'static,
    {
        Factory { callback: Rc::new(callback) }
    }

    /// Runs the callback.
    pub fn call(&self, container: &Container, params: &Params, config: &Config) -> DiResult<Instance> {
        (self.callback)(container, params, config)
    }

    pub fn ptr_eq(a: &Factory, b: &Factory) -> bool {
        Rc::ptr_eq(&a.callback, &b.callback)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory(..)")
    }
}

/// Builder for a class-based definition: identifier, configuration map
/// (which must name a class) and constructor parameters.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Definition, Value};
///
/// let definition = Definition::new("mailer")
///     .class("app::Mailer")
///     .set("timeout", 10)
///     .param("smtp.local")
///     .depends_on(["log"]);
///
/// assert!(definition.is_valid());
/// let (id, config, params) = definition.into_parts();
/// assert_eq!(id, "mailer");
/// assert_eq!(config["class"], Value::from("app::Mailer"));
/// assert_eq!(config["depends_on"], Value::from(vec!["log"]));
/// assert_eq!(params.positional(), &[Value::from("smtp.local")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition {
    id: String,
    config: Config,
    params: Params,
}

impl Definition {
    pub fn new(id: impl Into<String>) -> Self {
        Definition { id: id.into(), config: Config::new(), params: Params::new() }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.config.insert(CLASS_KEY.to_string(), Value::String(class.into()));
        self
    }

    /// Adds a property assignment.
    pub fn set(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(property.into(), value.into());
        self
    }

    /// Adds a positional constructor argument.
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params = self.params.arg(value);
        self
    }

    /// Adds a named constructor argument.
    pub fn named_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params = self.params.named(name, value);
        self
    }

    /// Declares components that must be registered before this one.
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<Value> = ids.into_iter().map(|id| Value::String(id.into())).collect();
        self.config.insert(DEPENDS_ON_KEY.to_string(), Value::List(ids));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A definition is valid once its config is non-empty and names a class.
    pub fn is_valid(&self) -> bool {
        !self.config.is_empty() && matches!(self.config.get(CLASS_KEY), Some(Value::String(_)))
    }

    /// Normalized form consumed by registries.
    pub fn into_parts(self) -> (String, Config, Params) {
        (self.id, self.config, self.params)
    }
}
