//! Rule-based injection of already built objects into object graphs.
//!
//! A target declares which objects it accepts through [`InjectionRules`]:
//! strict rules match an object's exact class, polymorphic rules match any
//! class satisfying a base class or interface. The [`Injector`] offers each
//! object to the target and applies the first matching binding.

use std::collections::HashMap;
use std::rc::Rc;

use crate::catalog::ClassCatalog;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;

pub mod hooks;

pub use hooks::{ChildInjector, EventHooks, HookHandler, HookHost, INJECT_HOOK};

/// Where a matched object goes on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Assign to the named property
    Property(String),
    /// Call the named single-argument setter
    Setter(String),
}

impl Binding {
    pub fn property(name: impl Into<String>) -> Self {
        Binding::Property(name.into())
    }

    pub fn setter(name: impl Into<String>) -> Self {
        Binding::Setter(name.into())
    }
}

/// Injection rule tables of a target.
///
/// ```rust
/// use ferrous_wire::{Binding, InjectionRules};
///
/// let rules = InjectionRules::new()
///     .strict("app::FileCache", Binding::property("file_cache"))
///     .polymorphic("app::CacheInterface", Binding::setter("set_cache"));
/// assert_eq!(rules.strict_binding("app::FileCache"), Some(&Binding::property("file_cache")));
/// assert_eq!(rules.polymorphic_rules().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionRules {
    strict: HashMap<String, Binding>,
    polymorphic: Vec<(String, Binding)>,
}

impl InjectionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule matching objects whose class is exactly `class`.
    pub fn strict(mut self, class: impl Into<String>, binding: Binding) -> Self {
        self.strict.insert(class.into(), binding);
        self
    }

    /// Rule matching objects whose class satisfies `type_name`. Polymorphic
    /// rules are evaluated in the order they were added.
    pub fn polymorphic(mut self, type_name: impl Into<String>, binding: Binding) -> Self {
        self.polymorphic.push((type_name.into(), binding));
        self
    }

    pub fn strict_binding(&self, class: &str) -> Option<&Binding> {
        self.strict.get(class)
    }

    pub fn polymorphic_rules(&self) -> &[(String, Binding)] {
        &self.polymorphic
    }

    pub fn is_empty(&self) -> bool {
        self.strict.is_empty() && self.polymorphic.is_empty()
    }
}

/// An object that accepts injected objects.
pub trait InjectionTarget {
    fn injection_rules(&self) -> &InjectionRules;

    /// Stores `object` in the named property.
    fn assign(&mut self, property: &str, object: Instance) -> DiResult<()>;

    /// Calls the named single-argument setter with `object`.
    fn call_setter(&mut self, setter: &str, object: Instance) -> DiResult<()> {
        let _ = object;
        Err(DiError::invalid(format!("Calling unknown setter: {}", setter)))
    }
}

/// Applies [`InjectionRules`] using a [`ClassCatalog`] for type matching.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{
///     Binding, Class, ClassCatalog, ClassDescriptor, DiResult, InjectionRules, InjectionTarget, Injector, Instance,
/// };
/// use std::rc::Rc;
///
/// struct FileCache;
/// struct RedisCache;
///
/// struct Page {
///     rules: InjectionRules,
///     file_cache: Option<Instance>,
///     cache: Option<Instance>,
/// }
///
/// impl InjectionTarget for Page {
///     fn injection_rules(&self) -> &InjectionRules {
///         &self.rules
///     }
///
///     fn assign(&mut self, property: &str, object: Instance) -> DiResult<()> {
///         match property {
///             "file_cache" => self.file_cache = Some(object),
///             _ => self.cache = Some(object),
///         }
///         Ok(())
///     }
/// }
///
/// let catalog = Rc::new(ClassCatalog::new());
/// catalog.register(ClassDescriptor::interface("app::Cache"));
/// catalog.register(Class::<FileCache>::new("app::FileCache").implements("app::Cache"));
/// catalog.register(Class::<RedisCache>::new("app::RedisCache").implements("app::Cache"));
///
/// let mut page = Page {
///     rules: InjectionRules::new()
///         .strict("app::FileCache", Binding::property("file_cache"))
///         .polymorphic("app::Cache", Binding::property("cache")),
///     file_cache: None,
///     cache: None,
/// };
///
/// let injected = Injector::new(catalog)
///     .inject(&mut page, [Instance::new(FileCache), Instance::new(RedisCache), Instance::new(7u8)])
///     .unwrap();
/// assert_eq!(injected, 2);
/// assert!(page.file_cache.as_ref().unwrap().is::<FileCache>());
/// assert!(page.cache.as_ref().unwrap().is::<RedisCache>());
/// ```
#[derive(Clone)]
pub struct Injector {
    catalog: Rc<ClassCatalog>,
}

impl Injector {
    pub fn new(catalog: Rc<ClassCatalog>) -> Self {
        Injector { catalog }
    }

    pub fn catalog(&self) -> &Rc<ClassCatalog> {
        &self.catalog
    }

    /// Offers each object to `target` in iteration order and returns how many
    /// were injected. Objects no rule matches are skipped.
    pub fn inject<I>(&self, target: &mut dyn InjectionTarget, objects: I) -> DiResult<usize>
    where
        I: IntoIterator<Item = Instance>,
    {
        let mut injected = 0;
        for object in objects {
            let Some(binding) = self.binding_for(target.injection_rules(), &object) else {
                tracing::trace!(object = object.type_name(), "no injection rule matches");
                continue;
            };
            match binding {
                Binding::Property(property) => target.assign(&property, object)?,
                Binding::Setter(setter) => target.call_setter(&setter, object)?,
            }
            injected += 1;
        }
        Ok(injected)
    }

    /// [`inject`](Self::inject) for a single object; true if it was injected.
    pub fn inject_one(&self, target: &mut dyn InjectionTarget, object: Instance) -> DiResult<bool> {
        self.inject(target, [object]).map(|count| count == 1)
    }

    /// Strict rule on the exact class first, then the first satisfied
    /// polymorphic rule.
    fn binding_for(&self, rules: &InjectionRules, object: &Instance) -> Option<Binding> {
        let class = self.catalog.class_name_of(object)?;
        if let Some(binding) = rules.strict_binding(&class) {
            return Some(binding.clone());
        }
        rules
            .polymorphic_rules()
            .iter()
            .find(|(type_name, _)| self.catalog.satisfies(&class, type_name))
            .map(|(_, binding)| binding.clone())
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector").field("catalog", &self.catalog).finish()
    }
}
