//! Registration lifetime definitions.

/// Lifetimes controlling instance caching behavior
///
/// Every identifier registered in a [`Container`](crate::Container) is either a
/// singleton (cached on first successful resolution, identity stable until the
/// identifier is cleared or re-registered) or transient (built on every request).
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Class, ClassCatalog, Container, Lifetime, Registration};
/// use std::rc::Rc;
///
/// struct Database;
/// struct RequestModel;
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(Class::<Database>::new("app::Database").constructor(|_| Ok(Database)));
/// catalog.register(Class::<RequestModel>::new("app::RequestModel").constructor(|_| Ok(RequestModel)));
///
/// let container = Container::new(catalog);
/// container.set_singleton("db", Registration::class("app::Database"), Default::default()).unwrap();
/// container.set("model", Registration::class("app::RequestModel"), Default::default()).unwrap();
///
/// assert_eq!(container.lifetime("db"), Some(Lifetime::Singleton));
/// assert_eq!(container.lifetime("model"), Some(Lifetime::Transient));
///
/// // Singleton: same instance on every request
/// let db1 = container.get("db").unwrap();
/// let db2 = container.get("db").unwrap();
/// assert!(ferrous_wire::Instance::ptr_eq(&db1, &db2));
///
/// // Transient: always a different instance
/// let m1 = container.get("model").unwrap();
/// let m2 = container.get("model").unwrap();
/// assert!(!ferrous_wire::Instance::ptr_eq(&m1, &m2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance per container, cached on first resolution
    ///
    /// The cached instance is returned unchanged by every later `get` until the
    /// identifier is cleared or registered again.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Unless the definition itself is a pre-built object, every request runs
    /// the full construction path again.
    Transient,
}
