/// Unit tests for DiError and DiResult types

use ferrous_wire::{ClassCatalog, Container, DiError, DiResult, Params, ServiceLocator};
use std::error::Error;
use std::rc::Rc;

#[test]
fn test_error_display_invalid_config() {
    let error = DiError::InvalidConfig("A class definition requires a \"class\" member".into());
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Invalid configuration: A class definition requires a \"class\" member");
    assert!(display_str.contains("Invalid configuration"));
}

#[test]
fn test_error_display_not_instantiable() {
    let error = DiError::NotInstantiable("app::CacheInterface".into());
    assert_eq!(format!("{}", error), "Not instantiable: app::CacheInterface");
}

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound("mailer".into());
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Unknown component ID: mailer");
    assert!(!display_str.is_empty());
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("expected integer, found string".into());
    assert_eq!(format!("{}", error), "Type mismatch: expected integer, found string");
}

#[test]
fn test_error_kind_predicates() {
    assert!(DiError::InvalidConfig(String::new()).is_invalid_config());
    assert!(!DiError::InvalidConfig(String::new()).is_not_found());
    assert!(DiError::NotInstantiable(String::new()).is_not_instantiable());
    assert!(DiError::NotFound(String::new()).is_not_found());
    assert!(!DiError::TypeMismatch(String::new()).is_invalid_config());
}

#[test]
fn test_diresult_err() {
    let result: DiResult<String> = Err(DiError::NotFound("db".into()));
    match result {
        Err(DiError::NotFound(name)) => assert_eq!(name, "db"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_error_clone_and_eq() {
    let error = DiError::TypeMismatch("SomeType".into());
    let cloned = error.clone();
    assert_eq!(error, cloned);
    assert_eq!(format!("{}", error), format!("{}", cloned));
}

#[test]
fn test_error_as_std_error() {
    let error = DiError::NotFound("db".into());
    let _: &dyn std::error::Error = &error;
    assert!(error.source().is_none());

    // Boxes into the error type used by init steps
    let boxed: ferrous_wire::BoxError = Box::new(error);
    assert_eq!(boxed.to_string(), "Unknown component ID: db");
}

#[test]
fn test_each_failure_kind_surfaces_from_public_api() {
    let catalog = Rc::new(ClassCatalog::new());
    catalog.register(ferrous_wire::ClassDescriptor::interface("app::Shape"));
    let container = Rc::new(Container::new(catalog));

    let invalid = container.set("x", ferrous_wire::config! { "no" => "class" }, Params::new()).unwrap_err();
    assert!(invalid.is_invalid_config());

    let not_instantiable = container.get("app::Shape").unwrap_err();
    assert!(not_instantiable.is_not_instantiable());

    let locator = ServiceLocator::new(container);
    let not_found = locator.get_required("nothing").unwrap_err();
    assert!(not_found.is_not_found());
}
