//! Registry entries.

use crate::definition::{Definition, Factory};
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::value::{Config, Value, CLASS_KEY};

/// How to build or obtain the value for an identifier.
///
/// After [`normalize`](Registration::normalize) a `Config` entry is guaranteed
/// to carry a non-empty `class` string; the remaining keys are property values.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{config, DiError, Registration};
///
/// // A bare class name becomes `{class: name}`
/// let alias = Registration::from("app::FileCache").normalize("cache").unwrap();
/// assert_eq!(alias.class_name(), Some("app::FileCache"));
///
/// // An empty map means "build the identifier itself"
/// let own = Registration::Config(config! {}).normalize("app::Db").unwrap();
/// assert_eq!(own.class_name(), Some("app::Db"));
///
/// // A map without `class` is rejected
/// let err = Registration::Config(config! { "dsn" => "x" }).normalize("db").unwrap_err();
/// assert!(matches!(err, DiError::InvalidConfig(_)));
/// ```
#[derive(Debug, Clone)]
pub enum Registration {
    /// Configuration map naming a class plus property values
    Config(Config),
    /// Callback producing the value
    Factory(Factory),
    /// Pre-built object returned as-is
    Object(Instance),
}

impl Registration {
    /// `{class: name}`.
    pub fn class(name: impl Into<String>) -> Self {
        let mut config = Config::new();
        config.insert(CLASS_KEY.to_string(), Value::String(name.into()));
        Registration::Config(config)
    }

    /// Validates the shape and fills in the implicit class for `id`.
    pub fn normalize(self, id: &str) -> DiResult<Registration> {
        match self {
            Registration::Config(config) if config.is_empty() => Ok(Registration::class(id)),
            Registration::Config(config) => match config.get(CLASS_KEY) {
                Some(Value::String(class)) if !class.is_empty() => Ok(Registration::Config(config)),
                Some(other) => Err(DiError::invalid(format!(
                    "The \"class\" member of \"{}\" must be a non-empty string, found {}",
                    id,
                    other.kind()
                ))),
                None => Err(DiError::invalid(format!(
                    "A class definition requires a \"class\" member (registering \"{}\")",
                    id
                ))),
            },
            other => Ok(other),
        }
    }

    /// Target class of a `Config` entry.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Registration::Config(config) => match config.get(CLASS_KEY) {
                Some(Value::String(class)) => Some(class),
                _ => None,
            },
            _ => None,
        }
    }

    /// Property values of a `Config` entry (everything but `class`).
    pub fn properties(&self) -> Config {
        match self {
            Registration::Config(config) => config
                .iter()
                .filter(|(key, _)| key.as_str() != CLASS_KEY)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => Config::new(),
        }
    }
}

impl From<&str> for Registration {
    fn from(class: &str) -> Self {
        Registration::class(class)
    }
}

impl From<String> for Registration {
    fn from(class: String) -> Self {
        Registration::class(class)
    }
}

impl From<Config> for Registration {
    fn from(config: Config) -> Self {
        Registration::Config(config)
    }
}

impl From<Factory> for Registration {
    fn from(factory: Factory) -> Self {
        Registration::Factory(factory)
    }
}

impl From<Instance> for Registration {
    fn from(instance: Instance) -> Self {
        Registration::Object(instance)
    }
}

/// Uses the definition's config; its params are registered separately by
/// [`Container::set_definition`](crate::Container::set_definition).
impl From<Definition> for Registration {
    fn from(definition: Definition) -> Self {
        let (_, config, _) = definition.into_parts();
        Registration::Config(config)
    }
}
