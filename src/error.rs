//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// Represents the error conditions that can occur during service
/// registration, resolution, or scope teardown.
///
/// # Examples
///
/// ```rust
/// use graft_di::{DiError, ServiceCollection, Resolver};
///
/// // Resolving an unregistered service names the requested contract
/// let container = ServiceCollection::new().build();
/// match container.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Service not registered (and the request is not a collection).
    NotFound(&'static str),
    /// No viable constructor for an implementation, given the currently
    /// registered services.
    NoSuitableConstructor(&'static str),
    /// Circular dependency. Carries the full path when raised by the
    /// resolution guard, or every service on a cycle when raised by the
    /// validation pass.
    Circular(Vec<&'static str>),
    /// Operation on a scope that has already been disposed.
    ScopeDisposed,
    /// An implementation selector returned an identity outside its
    /// declared candidate set.
    UndeclaredImplementation {
        /// Service whose selector misbehaved.
        service: &'static str,
        /// The undeclared implementation it returned.
        implementation: &'static str,
    },
    /// Type downcast failed.
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded.
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Service not found: {}", name),
            DiError::NoSuitableConstructor(name) => {
                write!(f, "No suitable constructor for: {}", name)
            }
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::ScopeDisposed => write!(f, "Scope already disposed"),
            DiError::UndeclaredImplementation { service, implementation } => write!(
                f,
                "Selector for {} returned undeclared implementation: {}",
                service, implementation
            ),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
///
/// ```rust
/// use graft_di::{DiResult, DiError};
///
/// fn lookup() -> DiResult<u32> {
///     Err(DiError::NotFound("u32"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
