//! Error types for the wiring engine.

/// Boxed error returned by blocking-init steps and user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wiring errors
///
/// Represents the error conditions that can occur during registration,
/// resolution, construction or injection. Every variant carries a
/// human-readable message and is recoverable by the immediate caller.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ClassCatalog, Container, DiError};
/// use std::rc::Rc;
///
/// let container = Container::new(Rc::new(ClassCatalog::new()));
/// match container.get("app::Missing") {
///     Err(DiError::NotInstantiable(msg)) => assert!(msg.contains("app::Missing")),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_wire::DiError;
///
/// let invalid = DiError::InvalidConfig("A class definition requires a \"class\" member".into());
/// let not_found = DiError::NotFound("db".into());
///
/// assert_eq!(not_found.to_string(), "Unknown component ID: db");
/// println!("Error: {}", invalid);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
    /// Malformed registration, unresolvable parameter, alias cycle or
    /// circular `depends_on` declaration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Resolution ended at an abstract class or interface, or the target
    /// has no class metadata to construct it from
    #[error("Not instantiable: {0}")]
    NotInstantiable(String),
    /// Requested identifier has no definition and no cached instance
    #[error("Unknown component ID: {0}")]
    NotFound(String),
    /// A value or object did not have the requested type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

impl DiError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DiError::InvalidConfig(msg.into())
    }

    pub(crate) fn not_instantiable(msg: impl Into<String>) -> Self {
        DiError::NotInstantiable(msg.into())
    }

    pub(crate) fn mismatch(msg: impl Into<String>) -> Self {
        DiError::TypeMismatch(msg.into())
    }

    /// Returns true for [`DiError::InvalidConfig`].
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, DiError::InvalidConfig(_))
    }

    /// Returns true for [`DiError::NotInstantiable`].
    pub fn is_not_instantiable(&self) -> bool {
        matches!(self, DiError::NotInstantiable(_))
    }

    /// Returns true for [`DiError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }
}

/// Result type for wiring operations
///
/// A convenience alias for `Result<T, DiError>` used throughout ferrous-wire.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{DiResult, DiError};
///
/// fn lookup() -> DiResult<String> {
///     Err(DiError::NotFound("mailer".into()))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
