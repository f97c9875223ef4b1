//! Values carried by definitions, configuration maps and parameter lists.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::instance::Instance;

/// Configuration map: property name to value.
///
/// The `class` key is reserved for the target class identifier.
pub type Config = BTreeMap<String, Value>;

/// Reserved configuration key naming the target class.
pub const CLASS_KEY: &str = "class";

/// Reserved configuration key listing component dependencies.
pub const DEPENDS_ON_KEY: &str = "depends_on";

/// A value that can appear in a configuration map or parameter list.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Value, Instance};
///
/// let port = Value::from(8080);
/// assert_eq!(port.as_i64().unwrap(), 8080);
///
/// let name = Value::from("primary");
/// assert_eq!(name.as_str().unwrap(), "primary");
///
/// let db = Value::reference("db");
/// assert!(db.is_reference());
///
/// let object = Value::from(Instance::new(42u8));
/// assert_eq!(*object.as_object().unwrap().downcast::<u8>().unwrap(), 42);
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// An already built object
    Object(Instance),
    /// Lazy reference to another identifier, resolved at binding time
    Reference(String),
}

impl Value {
    /// Creates a lazy reference to another identifier.
    pub fn reference(id: impl Into<String>) -> Self {
        Value::Reference(id.into())
    }

    /// Wraps a value as an object.
    pub fn object<T: Send + Sync + 'static>(value: T) -> Self {
        Value::Object(Instance::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Reference(_) => "reference",
        }
    }

    /// Try to view as a string
    pub fn as_str(&self) -> DiResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(DiError::mismatch(format!("expected string, found {}", other.kind()))),
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> DiResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(DiError::mismatch(format!("expected integer, found {}", other.kind()))),
        }
    }

    /// Try to convert to float; integers widen
    pub fn as_f64(&self) -> DiResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(DiError::mismatch(format!("expected float, found {}", other.kind()))),
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> DiResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(DiError::mismatch(format!("expected bool, found {}", other.kind()))),
        }
    }

    pub fn as_list(&self) -> DiResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(DiError::mismatch(format!("expected list, found {}", other.kind()))),
        }
    }

    pub fn as_object(&self) -> DiResult<&Instance> {
        match self {
            Value::Object(instance) => Ok(instance),
            other => Err(DiError::mismatch(format!("expected object, found {}", other.kind()))),
        }
    }

    /// Downcasts an object value to its concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.as_object()?.downcast::<T>()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => Instance::ptr_eq(a, b),
            (Value::Reference(a), Value::Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Config> for Value {
    fn from(map: Config) -> Self {
        Value::Map(map)
    }
}

/// Builds a [`Config`] map from `key => value` pairs.
///
/// ```rust
/// use ferrous_wire::{config, Value};
///
/// let cfg = config! {
///     "class" => "app::Mailer",
///     "port" => 25,
/// };
/// assert_eq!(cfg["class"], Value::from("app::Mailer"));
/// assert_eq!(cfg.len(), 2);
/// ```
#[macro_export]
macro_rules! config {
    () => { $crate::Config::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Config::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}

/// Constructor or callable arguments supplied by a caller.
///
/// Positional values bind by declaration index, named values bind by parameter
/// name and take precedence over positional ones.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Params, Value};
///
/// let registered = Params::new().arg("localhost").arg(25);
/// let caller = Params::new().arg("smtp.example.com").named("port", 587);
///
/// let merged = registered.merged_with(&caller);
/// assert_eq!(merged.positional(), &[Value::from("smtp.example.com"), Value::from(25)]);
/// assert_eq!(merged.get_named("port"), Some(&Value::from(587)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a positional-only parameter list.
    pub fn positional_from<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params {
            positional: values.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn get_positional(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    pub fn named_iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.named.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Overlays `overrides` on top of `self`: positional values replace by
    /// index, named values replace by name.
    pub fn merged_with(&self, overrides: &Params) -> Params {
        let mut merged = self.clone();
        for (index, value) in overrides.positional.iter().enumerate() {
            if index < merged.positional.len() {
                merged.positional[index] = value.clone();
            } else {
                merged.positional.push(value.clone());
            }
        }
        for (name, value) in &overrides.named {
            merged.named.insert(name.clone(), value.clone());
        }
        merged
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.positional.iter_mut().chain(self.named.values_mut())
    }
}

/// Overlays `overrides` on `base`, the override winning per key.
pub(crate) fn merge_config(base: &Config, overrides: &Config) -> Config {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
