//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::BoxFutureUnit;
use crate::key::{key_of, parameterized_key_of, trait_key_of, ServiceKey};
use crate::traits::{AsyncDispose, Dispose};

/// Core resolver trait for object-safe service resolution.
///
/// Provides the type-erased resolution entry points shared by the
/// container, scopes, and the context handed to factories. Most users
/// should use the [`Resolver`] trait instead, which layers type-safe
/// generic methods on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service under the circular-resolution guard.
    ///
    /// For collection keys this yields the full provider sequence as one
    /// erased `Arc<Vec<_>>` value; unregistered collections resolve to an
    /// empty sequence rather than an error.
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<Arc<dyn std::any::Any + Send + Sync>>;

    /// Resolves every binding for an element identity: the active binding
    /// first, then superseded ones, most-recently-superseded first. Each
    /// instance honors its own binding's lifetime. Unregistered
    /// identities yield an empty sequence.
    fn resolve_many(
        &self,
        key: &ServiceKey,
    ) -> DiResult<Vec<Arc<dyn std::any::Any + Send + Sync>>>;

    /// Registers a synchronous disposal hook with the owning lifetime
    /// boundary (scope or container).
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// High-level resolver interface with generic, type-safe methods.
///
/// Implemented by [`Container`](crate::Container), [`Scope`](crate::Scope)
/// and the [`ResolverContext`](crate::ResolverContext) passed to
/// factories, making them interchangeable for resolution within their
/// respective lifetimes.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".to_string() }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42usize);
/// services.add_singleton_trait::<dyn Greeter>(Arc::new(English));
///
/// let container = services.build();
/// assert_eq!(*container.get_required::<usize>(), 42);
/// assert_eq!(container.get_required_trait::<dyn Greeter>().greet(), "hello");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = key_of::<T>();
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a closed generic service, falling back to its family
    /// template when no exact binding exists.
    fn get_parameterized<T: 'static + Send + Sync, F: 'static>(&self) -> DiResult<Arc<T>> {
        let key = parameterized_key_of::<T, F>();
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a single trait implementation: the most recently
    /// registered binding for the contract.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let key = trait_key_of::<T>();
        let any = self.resolve_any(&key)?;
        // Trait objects are stored as Arc<Arc<dyn Trait>> inside the Any.
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves every provider of a concrete service type, current and
    /// superseded, each honoring its own registered lifetime.
    fn get_all<T: 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        let key = key_of::<T>();
        let anys = self.resolve_many(&key)?;
        let mut results = Vec::with_capacity(anys.len());
        for any in anys {
            let arc = any
                .downcast::<T>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))?;
            results.push(arc);
        }
        Ok(results)
    }

    /// Resolves every provider of a trait contract, current and
    /// superseded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Handler: Send + Sync {
    ///     fn name(&self) -> &'static str;
    /// }
    /// struct First;
    /// impl Handler for First {
    ///     fn name(&self) -> &'static str { "first" }
    /// }
    /// struct Second;
    /// impl Handler for Second {
    ///     fn name(&self) -> &'static str { "second" }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Handler>(Arc::new(First));
    /// services.add_singleton_trait::<dyn Handler>(Arc::new(Second));
    ///
    /// let container = services.build();
    /// // Active binding first, then superseded history.
    /// let handlers = container.get_all_trait::<dyn Handler>().unwrap();
    /// assert_eq!(handlers.len(), 2);
    /// assert_eq!(handlers[0].name(), "second");
    /// assert_eq!(handlers[1].name(), "first");
    /// ```
    fn get_all_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>>
    where
        Arc<T>: 'static,
    {
        let key = trait_key_of::<T>();
        let anys = self.resolve_many(&key)?;
        let mut results = Vec::with_capacity(anys.len());
        for any in anys {
            let arc = any
                .downcast::<Arc<T>>()
                .map(|boxed| (*boxed).clone())
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))?;
            results.push(arc);
        }
        Ok(results)
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// Use when the service is known to be registered and a
    /// misconfiguration should fail fast.
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_trait::<T>().unwrap_or_else(|e| {
            panic!("Failed to resolve trait {}: {:?}", std::any::type_name::<T>(), e)
        })
    }

    /// Registers a service for synchronous disposal with the owning
    /// lifetime boundary. Hooks run in LIFO order.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal. Async hooks run
    /// before sync hooks, in LIFO order.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move {
                service.dispose().await;
            })
        }));
    }
}
