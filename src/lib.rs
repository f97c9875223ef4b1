//! # ferrous-wire
//!
//! Object-graph construction for Rust: a definition registry with alias
//! resolution, metadata-driven constructor binding, a named-component service
//! locator with dependency-ordered startup, and rule-based injection of built
//! objects into object graphs.
//!
//! ## Features
//!
//! - **Alias chains**: identifiers resolve through aliases and interface
//!   bindings down to a concrete class, with cycle detection
//! - **Parameter binding**: named and positional params, config entries,
//!   typed dependencies resolved through the container, and defaults
//! - **Singletons**: per-identifier caching with identity preserved
//! - **Service locator**: `depends_on` ordering and sequential async init
//! - **Injection**: strict and polymorphic rules, re-armable child injection
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{Class, ClassCatalog, Container, Params, Registration};
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Describe the classes once
//! let catalog = Rc::new(ClassCatalog::new());
//! catalog.register(
//!     Class::<Database>::new("app::Database")
//!         .param_default("dsn", "postgres://localhost")
//!         .constructor(|args| Ok(Database { dsn: args.string("dsn")? })),
//! );
//! catalog.register(
//!     Class::<UserService>::new("app::UserService")
//!         .dependency("db", "app::Database")
//!         .constructor(|args| Ok(UserService { db: args.object::<Database>("db")? })),
//! );
//!
//! // Register definitions and resolve
//! let container = Container::new(catalog);
//! container
//!     .set_singleton("app::Database", Registration::class("app::Database"), Params::new())
//!     .unwrap();
//!
//! let users = container.get_as::<UserService>("app::UserService").unwrap();
//! assert_eq!(users.db.dsn, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: built on first request and shared afterwards
//! - **Transient**: built fresh on every request
//!
//! ## Calling functions
//!
//! ```rust
//! use ferrous_wire::{Callable, Class, ClassCatalog, Container, Params, Value};
//! use std::rc::Rc;
//!
//! struct Formatter;
//! impl Formatter {
//!     fn wrap(&self, s: &str) -> String {
//!         format!("<{}>", s)
//!     }
//! }
//!
//! let catalog = Rc::new(ClassCatalog::new());
//! catalog.register(Class::<Formatter>::new("app::Formatter").constructor(|_| Ok(Formatter)));
//! let container = Container::new(catalog);
//!
//! let render = Callable::new("render", |args| {
//!     let formatter = args.object::<Formatter>("formatter")?;
//!     Ok(Value::from(formatter.wrap(&args.string("text")?)))
//! })
//! .param("text")
//! .dependency("formatter", "app::Formatter");
//!
//! let out = container.invoke(&render, Params::new().named("text", "Hello World!")).unwrap();
//! assert_eq!(out, Value::from("<Hello World!>"));
//! ```

// Module declarations
pub mod catalog;
pub mod container;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod inject;
pub mod instance;
pub mod lifetime;
pub mod locator;
pub mod observer;
pub mod registration;
pub mod value;

#[cfg(feature = "config")]
pub mod config;

// Internal modules
mod internal;

// Re-export core types
pub use catalog::ClassCatalog;
pub use container::Container;
pub use definition::{Definition, Factory};
pub use descriptors::{Args, Callable, Class, ClassDescriptor, ClassKind, ParamKind, ParamSpec};
pub use error::{BoxError, DiError, DiResult};
pub use inject::{
    Binding, ChildInjector, EventHooks, HookHandler, HookHost, InjectionRules, InjectionTarget, Injector, INJECT_HOOK,
};
pub use instance::Instance;
pub use lifetime::Lifetime;
pub use locator::{
    BlockingInit, Component, ComponentDefinition, ComponentState, Components, LocatorOptions, ServiceLocator,
    DEFAULT_INIT_TIMEOUT,
};
pub use observer::{LocatorObserver, LoggingObserver};
pub use registration::Registration;
pub use value::{Config, Params, Value, CLASS_KEY, DEPENDS_ON_KEY};

#[cfg(feature = "config")]
pub use config::{components_from_json, LocatorSettings};
