//! Parameter binding shared by construction and `invoke`.

use crate::descriptors::{ParamKind, ParamSpec};
use crate::error::{DiError, DiResult};
use crate::value::{Config, Params, Value};

use super::Container;

/// Binds `declared` in declaration order.
///
/// For each parameter: named param, then positional param at its index, then a
/// config entry of the same name (removed from `config` so it is not applied
/// again as a property), then the declared object type resolved through
/// `container`, then the declared default. Bound references are resolved.
pub(crate) fn bind_params(
    container: &Container,
    owner: &str,
    declared: &[ParamSpec],
    params: &Params,
    mut config: Option<&mut Config>,
) -> DiResult<Vec<(String, Value)>> {
    let mut bound = Vec::with_capacity(declared.len());
    for (index, param) in declared.iter().enumerate() {
        let supplied = params
            .get_named(&param.name)
            .or_else(|| params.get_positional(index))
            .cloned()
            .or_else(|| config.as_mut().and_then(|c| c.remove(&param.name)));

        let value = match supplied {
            Some(value) => container.resolve_value(value)?,
            None => resolve_unsupplied(container, owner, param)?,
        };
        bound.push((param.name.clone(), value));
    }

    if let Some(extra) = unknown_named(declared, params) {
        tracing::debug!(owner, param = extra, "ignoring named argument with no matching parameter");
    }
    Ok(bound)
}

fn resolve_unsupplied(container: &Container, owner: &str, param: &ParamSpec) -> DiResult<Value> {
    match &param.kind {
        ParamKind::Object(type_id) => match container.get(type_id) {
            Ok(instance) => Ok(Value::Object(instance)),
            Err(err @ (DiError::NotInstantiable(_) | DiError::NotFound(_))) => match &param.default {
                Some(default) => {
                    tracing::trace!(owner, param = %param.name, "dependency unavailable, using default");
                    Ok(default.clone())
                }
                None => Err(DiError::invalid(format!(
                    "Missing required parameter \"{}\" when instantiating \"{}\": {}",
                    param.name, owner, err
                ))),
            },
            Err(err) => Err(err),
        },
        ParamKind::Value => param.default.clone().ok_or_else(|| {
            DiError::invalid(format!(
                "Missing required parameter \"{}\" when instantiating \"{}\"",
                param.name, owner
            ))
        }),
    }
}

fn unknown_named<'a>(declared: &[ParamSpec], params: &'a Params) -> Option<&'a str> {
    params
        .named_iter()
        .map(|(name, _)| name.as_str())
        .find(|name| !declared.iter().any(|param| param.name == *name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use crate::config;
    use crate::descriptors::ClassDescriptor;
    use std::rc::Rc;

    fn container() -> Container {
        let catalog = Rc::new(ClassCatalog::new());
        catalog.register(ClassDescriptor::interface("app::LoggerInterface"));
        Container::new(catalog)
    }

    #[test]
    fn test_named_beats_positional_beats_config() {
        let container = container();
        let declared = vec![ParamSpec::value("host"), ParamSpec::value("port").with_default(25)];
        let mut cfg = config! { "host" => "from-config", "port" => 1 };

        let bound = bind_params(
            &container,
            "app::Mailer",
            &declared,
            &Params::new().arg("positional").named("host", "named"),
            Some(&mut cfg),
        )
        .unwrap();

        assert_eq!(bound[0], ("host".to_string(), Value::from("named")));
        // Port came from config and was consumed
        assert_eq!(bound[1], ("port".to_string(), Value::from(1)));
        assert_eq!(cfg.get("host"), Some(&Value::from("from-config")));
        assert!(!cfg.contains_key("port"));
    }

    #[test]
    fn test_unavailable_dependency_uses_default_or_fails() {
        let container = container();
        let optional = vec![ParamSpec::object("logger", "app::LoggerInterface").with_default(Value::Null)];
        let bound = bind_params(&container, "app::Service", &optional, &Params::new(), None).unwrap();
        assert_eq!(bound[0].1, Value::Null);

        let required = vec![ParamSpec::object("logger", "app::LoggerInterface")];
        let err = bind_params(&container, "app::Service", &required, &Params::new(), None).unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("\"logger\""));
        assert!(err.to_string().contains("app::Service"));
    }

    #[test]
    fn test_missing_value_param_is_invalid_config() {
        let container = container();
        let declared = vec![ParamSpec::value("dsn")];
        let err = bind_params(&container, "app::Db", &declared, &Params::new(), None).unwrap_err();
        assert_eq!(
            err,
            DiError::InvalidConfig("Missing required parameter \"dsn\" when instantiating \"app::Db\"".into())
        );
    }
}
