//! Type-erased shared objects.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// An object produced or held by the container.
///
/// Wraps an `Arc<dyn Any + Send + Sync>` together with the runtime type tag of
/// the wrapped value. Cloning an `Instance` shares the same object, so identity
/// can be compared with [`Instance::ptr_eq`].
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::Instance;
///
/// struct Database { url: String }
///
/// let db = Instance::new(Database { url: "postgres://localhost".into() });
/// let again = db.clone();
///
/// assert!(Instance::ptr_eq(&db, &again));
/// assert_eq!(db.downcast::<Database>().unwrap().url, "postgres://localhost");
/// assert!(db.downcast::<String>().is_err());
/// ```
#[derive(Clone)]
pub struct Instance {
    value: AnyArc,
    type_id: TypeId,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a freshly built value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without re-allocating.
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Instance {
            value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Runtime type of the wrapped value (not of the `Arc`).
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the wrapped value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the wrapped value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Downcasts to the concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.value.clone().downcast::<T>().map_err(|_| {
            DiError::mismatch(format!(
                "expected `{}`, found `{}`",
                std::any::type_name::<T>(),
                self.type_name
            ))
        })
    }

    /// Borrows the concrete value.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same object.
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }

    pub(crate) fn as_any_arc(&self) -> AnyArc {
        self.value.clone()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_is_the_inner_type() {
        let instance = Instance::new(7u32);
        assert_eq!(instance.type_id(), TypeId::of::<u32>());
        assert!(instance.is::<u32>());
        assert!(!instance.is::<Arc<u32>>());
    }

    #[test]
    fn test_from_arc_keeps_identity() {
        let shared = Arc::new(String::from("shared"));
        let instance = Instance::from_arc(shared.clone());
        let back = instance.downcast::<String>().unwrap();
        assert!(Arc::ptr_eq(&shared, &back));
    }

    #[test]
    fn test_downcast_mismatch_names_both_types() {
        let instance = Instance::new(1i64);
        match instance.downcast::<String>() {
            Err(DiError::TypeMismatch(msg)) => {
                assert!(msg.contains("String"));
                assert!(msg.contains("i64"));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
