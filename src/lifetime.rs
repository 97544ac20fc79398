//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior.
///
/// Defines how service instances are created, cached, and shared by the
/// container. Each lifetime has different reuse semantics:
///
/// - **Singleton**: one instance per container, created exactly once
/// - **Scoped**: one instance per scope; a root-level request falls back
///   to the singleton path (documented fallback, not an error)
/// - **Transient**: a fresh instance on every resolution
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Resolver};
///
/// struct Database { url: String }
/// struct UnitOfWork { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: one instance for the whole container
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string(),
/// });
///
/// // Scoped: one instance per scope
/// services.add_scoped_factory::<UnitOfWork, _>(|_| UnitOfWork { id: 7 });
///
/// let container = services.build();
///
/// let db1 = container.get_required::<Database>();
/// let scope = container.create_scope();
/// let db2 = scope.get_required::<Database>();
/// assert!(std::ptr::eq(&*db1, &*db2)); // Same singleton everywhere
///
/// let uow1 = scope.get_required::<UnitOfWork>();
/// let uow2 = scope.get_required::<UnitOfWork>();
/// assert!(std::ptr::eq(&*uow1, &*uow2)); // Same within one scope
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance per container, cached for the container's life.
    ///
    /// Created at most once even under concurrent first access; the
    /// construction is serialized per identity.
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime.
    ///
    /// Requested without a scope, the service falls back to the singleton
    /// path rather than failing.
    Scoped,
    /// New instance per resolution, never cached.
    Transient,
}
