//! Class catalog: runtime construction metadata and type matching.
//!
//! The catalog is the container's view of the type system. It answers three
//! questions: how to build a class identifier, which class a runtime object
//! belongs to, and whether that class satisfies a type identifier (itself or
//! any base class/interface reachable through declared supertypes).

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use crate::descriptors::ClassDescriptor;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;

/// Registry of [`ClassDescriptor`]s keyed by class identifier.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Class, ClassCatalog, ClassDescriptor, Instance};
///
/// struct FileCache;
///
/// let catalog = ClassCatalog::new();
/// catalog.register(ClassDescriptor::interface("app::CacheInterface"));
/// catalog.register(ClassDescriptor::abstract_class("app::BaseCache").extends("app::CacheInterface"));
/// catalog.register(
///     Class::<FileCache>::new("app::FileCache")
///         .extends("app::BaseCache")
///         .constructor(|_| Ok(FileCache)),
/// );
///
/// assert!(catalog.satisfies("app::FileCache", "app::CacheInterface"));
///
/// let cache = Instance::new(FileCache);
/// assert_eq!(catalog.class_name_of(&cache).as_deref(), Some("app::FileCache"));
/// ```
#[derive(Default)]
pub struct ClassCatalog {
    classes: RefCell<HashMap<String, Rc<ClassDescriptor>>>,
    by_type: RefCell<HashMap<TypeId, String>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a class description.
    ///
    /// A Rust type maps back to the first class name registered for it; a
    /// second name for the same type is still constructible by name but never
    /// claims objects of that type.
    pub fn register(&self, descriptor: impl Into<ClassDescriptor>) -> &Self {
        let descriptor = descriptor.into();
        tracing::trace!(class = %descriptor.name, kind = ?descriptor.kind, "registering class");
        if let Some(type_id) = descriptor.type_id {
            let mut by_type = self.by_type.borrow_mut();
            match by_type.get(&type_id).cloned() {
                Some(existing) if existing != descriptor.name => {
                    tracing::warn!(
                        class = %descriptor.name,
                        existing = %existing,
                        "type already registered under another class name, keeping the existing mapping"
                    );
                }
                _ => {
                    by_type.insert(type_id, descriptor.name.clone());
                }
            }
        }
        self.classes.borrow_mut().insert(descriptor.name.clone(), Rc::new(descriptor));
        self
    }

    pub fn get(&self, class: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.borrow().get(class).cloned()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.borrow().contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.classes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.borrow().is_empty()
    }

    /// Class identifier registered for the runtime type of `instance`.
    pub fn class_name_of(&self, instance: &Instance) -> Option<String> {
        self.by_type.borrow().get(&instance.type_id()).cloned()
    }

    /// Descriptor registered for the runtime type of `instance`.
    pub fn descriptor_of(&self, instance: &Instance) -> Option<Rc<ClassDescriptor>> {
        let name = self.class_name_of(instance)?;
        self.get(&name)
    }

    /// Polymorphic test: `class` is `type_name` or (transitively) extends or
    /// implements it. Unknown classes only satisfy their own name.
    pub fn satisfies(&self, class: &str, type_name: &str) -> bool {
        let mut pending = vec![class.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            if current == type_name {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(descriptor) = self.get(&current) {
                pending.extend(descriptor.supertypes.iter().cloned());
            }
        }
        false
    }

    /// Polymorphic test against a runtime object.
    pub fn instance_satisfies(&self, instance: &Instance, type_name: &str) -> bool {
        match self.class_name_of(instance) {
            Some(class) => self.satisfies(&class, type_name),
            None => false,
        }
    }

    /// Views `instance` as `Arc<D>`, either through a caster declared with
    /// [`Class::implements_as`](crate::Class::implements_as) or because the
    /// object already is an `Arc<D>`.
    pub fn cast<D: ?Sized + 'static>(&self, instance: &Instance) -> DiResult<Arc<D>> {
        if let Some(shared) = instance.downcast_ref::<Arc<D>>() {
            return Ok(shared.clone());
        }
        let target = TypeId::of::<D>();
        if let Some(descriptor) = self.descriptor_of(instance) {
            for caster in descriptor.casters.iter().filter(|c| c.target == target) {
                if let Some(boxed) = (caster.cast)(instance.as_any_arc()) {
                    if let Ok(cast) = boxed.downcast::<Arc<D>>() {
                        return Ok(*cast);
                    }
                }
            }
        }
        Err(DiError::mismatch(format!(
            "`{}` does not provide `{}`",
            instance.type_name(),
            std::any::type_name::<D>()
        )))
    }
}

impl std::fmt::Debug for ClassCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.classes.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("ClassCatalog").field("classes", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Class;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn test_satisfies_walks_supertypes_and_tolerates_loops() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassDescriptor::interface("A").extends("B"));
        catalog.register(ClassDescriptor::interface("B").extends("A"));
        assert!(catalog.satisfies("A", "B"));
        assert!(!catalog.satisfies("A", "C"));
        assert!(catalog.satisfies("Unknown", "Unknown"));
    }

    #[test]
    fn test_cast_through_declared_caster() {
        let catalog = ClassCatalog::new();
        catalog.register(
            Class::<English>::new("app::English")
                .implements_as::<dyn Greeter>("app::Greeter", |e| e)
                .constructor(|_| Ok(English)),
        );
        let instance = Instance::new(English);
        let greeter = catalog.cast::<dyn Greeter>(&instance).unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_cast_of_prebuilt_trait_object() {
        let catalog = ClassCatalog::new();
        let shared: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::new(shared);
        assert_eq!(catalog.cast::<dyn Greeter>(&instance).unwrap().greet(), "hello");
    }

    #[test]
    fn test_second_class_name_for_a_type_keeps_first_mapping() {
        let catalog = ClassCatalog::new();
        catalog.register(Class::<English>::new("app::English").constructor(|_| Ok(English)));
        catalog.register(Class::<English>::new("app::British").constructor(|_| Ok(English)));

        assert_eq!(catalog.class_name_of(&Instance::new(English)).as_deref(), Some("app::English"));
        assert!(catalog.contains("app::British"));

        // Re-registering under the mapped name still replaces its descriptor
        catalog.register(Class::<English>::new("app::English").autoload().constructor(|_| Ok(English)));
        assert!(catalog.get("app::English").unwrap().is_autoload());
        assert_eq!(catalog.class_name_of(&Instance::new(English)).as_deref(), Some("app::English"));
    }

    #[test]
    fn test_cast_without_caster_is_mismatch() {
        let catalog = ClassCatalog::new();
        let err = catalog.cast::<dyn Greeter>(&Instance::new(English)).err().unwrap();
        assert!(matches!(err, DiError::TypeMismatch(_)));
    }
}
