//! JSON component maps and locator options.
//!
//! Available with the `config` feature. Component maps use the same shapes
//! as programmatic registration:
//!
//! - `"id": "app::Class"`: bare class name
//! - `"id": {"class": "app::Class", "depends_on": ["other"], "prop": 1}`: config map
//! - `"id": [{"class": "app::Class"}, ["positional", 2]]`: config map plus params;
//!   params may also be an object of named values
//!
//! `{"$ref": "id"}` anywhere in a value is a lazy reference to another
//! component. Key order of the document is kept, so unconstrained components
//! register in the order they are written.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{DiError, DiResult};
use crate::locator::{Component, LocatorOptions, ServiceLocator, DEFAULT_INIT_TIMEOUT};
use crate::value::{Config, Params, Value, CLASS_KEY};

const REFERENCE_KEY: &str = "$ref";

/// Serialized form of [`LocatorOptions`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorSettings {
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,
    #[serde(default)]
    pub autoload: bool,
}

fn default_init_timeout_ms() -> u64 {
    DEFAULT_INIT_TIMEOUT.as_millis() as u64
}

impl From<LocatorSettings> for LocatorOptions {
    fn from(settings: LocatorSettings) -> Self {
        LocatorOptions { init_timeout: Duration::from_millis(settings.init_timeout_ms), autoload: settings.autoload }
    }
}

impl LocatorOptions {
    /// Parses options from JSON; missing fields take their defaults.
    ///
    /// ```rust
    /// use ferrous_wire::LocatorOptions;
    /// use std::time::Duration;
    ///
    /// let options = LocatorOptions::from_json(r#"{"init_timeout_ms": 500}"#).unwrap();
    /// assert_eq!(options.init_timeout, Duration::from_millis(500));
    /// assert!(!options.autoload);
    /// ```
    pub fn from_json(json: &str) -> DiResult<Self> {
        let settings: LocatorSettings = serde_json::from_str(json).map_err(parse_error)?;
        Ok(settings.into())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(id)) = map.get(REFERENCE_KEY) {
                        return Value::Reference(id.clone());
                    }
                }
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Parses a JSON component map into ordered `(id, component)` entries.
pub fn components_from_json(json: &str) -> DiResult<Vec<(String, Component)>> {
    let document: serde_json::Value = serde_json::from_str(json).map_err(parse_error)?;
    let serde_json::Value::Object(entries) = document else {
        return Err(DiError::invalid("A component map must be a JSON object"));
    };
    entries
        .into_iter()
        .map(|(id, entry)| component_from_json(&id, entry).map(|component| (id, component)))
        .collect()
}

fn component_from_json(id: &str, entry: serde_json::Value) -> DiResult<Component> {
    match entry {
        serde_json::Value::String(class) => {
            let mut config = Config::new();
            config.insert(CLASS_KEY.to_string(), Value::String(class));
            Ok(Component::Config(config))
        }
        serde_json::Value::Object(_) => Ok(Component::Config(config_of(id, entry)?)),
        serde_json::Value::Array(mut pair) if pair.len() == 2 => {
            let params = params_of(id, pair.pop().unwrap_or_default())?;
            let config = config_of(id, pair.pop().unwrap_or_default())?;
            Ok(Component::WithParams(config, params))
        }
        other => Err(DiError::invalid(format!(
            "Component \"{}\" must be a class name, a config object or a [config, params] pair, found {}",
            id,
            Value::from(other).kind()
        ))),
    }
}

fn config_of(id: &str, json: serde_json::Value) -> DiResult<Config> {
    match Value::from(json) {
        Value::Map(config) => Ok(config),
        other => Err(DiError::invalid(format!(
            "Component \"{}\" config must be an object, found {}",
            id,
            other.kind()
        ))),
    }
}

fn params_of(id: &str, json: serde_json::Value) -> DiResult<Params> {
    match Value::from(json) {
        Value::List(values) => Ok(Params::positional_from(values)),
        Value::Map(named) => Ok(named.into_iter().fold(Params::new(), |params, (k, v)| params.named(k, v))),
        Value::Null => Ok(Params::new()),
        other => Err(DiError::invalid(format!(
            "Component \"{}\" params must be a list or an object, found {}",
            id,
            other.kind()
        ))),
    }
}

fn parse_error(err: serde_json::Error) -> DiError {
    DiError::invalid(format!("Malformed JSON: {}", err))
}

impl ServiceLocator {
    /// Registers the components of a JSON component map with
    /// [`set_components`](ServiceLocator::set_components).
    ///
    /// ```rust
    /// use ferrous_wire::{Class, ClassCatalog, Container, ServiceLocator};
    /// use std::rc::Rc;
    ///
    /// struct Log;
    /// struct Mailer;
    ///
    /// let catalog = Rc::new(ClassCatalog::new());
    /// catalog.register(Class::<Log>::new("app::Log").constructor(|_| Ok(Log)));
    /// catalog.register(Class::<Mailer>::new("app::Mailer").constructor(|_| Ok(Mailer)));
    ///
    /// let locator = ServiceLocator::new(Rc::new(Container::new(catalog)));
    /// locator
    ///     .load_json(r#"{
    ///         "mailer": {"class": "app::Mailer", "depends_on": ["log"]},
    ///         "log": "app::Log"
    ///     }"#)
    ///     .unwrap();
    /// assert_eq!(locator.ids(), vec!["log", "mailer"]);
    /// ```
    pub fn load_json(&self, json: &str) -> DiResult<()> {
        let components = components_from_json(json)?;
        tracing::debug!(count = components.len(), "loading components from JSON");
        self.set_components(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_objects_become_references() {
        let value = Value::from(serde_json::json!({"db": {"$ref": "database"}, "n": 1.5}));
        let Value::Map(map) = value else { panic!("expected map") };
        assert_eq!(map["db"], Value::reference("database"));
        assert_eq!(map["n"], Value::Float(1.5));
    }

    #[test]
    fn test_pair_form_carries_params() {
        let components = components_from_json(r#"{"db": [{"class": "app::Db"}, ["sqlite::memory:"]]}"#).unwrap();
        match &components[0].1 {
            Component::WithParams(config, params) => {
                assert_eq!(config[CLASS_KEY], Value::from("app::Db"));
                assert_eq!(params.positional(), &[Value::from("sqlite::memory:")]);
            }
            other => panic!("unexpected component {:?}", other),
        }
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(components_from_json("[1, 2]").unwrap_err().is_invalid_config());
        assert!(components_from_json("{").unwrap_err().is_invalid_config());
        assert!(LocatorOptions::from_json(r#"{"bogus": true}"#).unwrap_err().is_invalid_config());
    }
}
