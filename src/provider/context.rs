//! Resolver context passed to factories and constructor closures.

use crate::key::ServiceKey;
use crate::traits::{Resolver, ResolverCore};

/// Context handed to factory functions and constructor closures for
/// resolving their dependencies.
///
/// Wraps whichever resolver initiated the construction (the container
/// for singletons and root-level requests, the scope for scoped and
/// in-scope transient requests), so nested dependencies land in the
/// right cache and disposal hooks attach to the right lifetime boundary.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string(),
/// });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     // resolver is a ResolverContext
///     UserService {
///         db: resolver.get_required::<Database>(),
///     }
/// });
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &ServiceKey) -> crate::DiResult<crate::registration::AnyArc> {
        self.resolver.resolve_any(key)
    }

    fn resolve_many(
        &self,
        key: &ServiceKey,
    ) -> crate::DiResult<Vec<crate::registration::AnyArc>> {
        self.resolver.resolve_many(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.resolver.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> crate::internal::BoxFutureUnit + Send>) {
        self.resolver.push_async_disposer(f);
    }
}

impl<'a> Resolver for ResolverContext<'a> {}
