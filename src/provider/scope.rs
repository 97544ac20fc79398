//! Scoped service resolution and lifecycle management.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use super::{construct, resolve_one, resolve_sequence, Container};
use crate::error::{DiError, DiResult};
use crate::internal::{with_cycle_guard, BoxFutureUnit, DisposeBag};
use crate::key::ServiceKey;
use crate::registration::{AnyArc, BindingRecord};
use crate::traits::{Resolver, ResolverCore};

/// A disposable resolution boundary owning scoped instances.
///
/// A `Scope` resolves scoped services into its own cache while delegating
/// singletons to the container. Disposal is deterministic: the first
/// [`dispose`](Scope::dispose) call runs every queued teardown hook
/// exactly once in reverse-construction (LIFO) order and clears the
/// cache; later calls are no-ops, and resolution afterwards fails with
/// [`DiError::ScopeDisposed`].
///
/// # Lifetime behavior
///
/// - **Singleton**: resolved and cached in the container, shared by all
///   scopes
/// - **Scoped**: resolved and cached within this scope, one instance per
///   binding
/// - **Transient**: created fresh on every resolution
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Connection(&'static str);
/// struct UserService {
///     conn: Arc<Connection>,
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Connection, _>(|_| Connection("conn-1"));
/// services.add_transient_factory::<UserService, _>(|r| UserService {
///     conn: r.get_required::<Connection>(),
/// });
///
/// let container = services.build();
/// let scope = container.create_scope();
///
/// // Services resolved in the same scope share the scoped connection.
/// let a = scope.get_required::<UserService>();
/// let b = scope.get_required::<UserService>();
/// assert!(Arc::ptr_eq(&a.conn, &b.conn));
///
/// scope.dispose();
/// assert!(scope.get::<UserService>().is_err());
/// ```
pub struct Scope {
    id: u64,
    root: Container,
    /// Scoped instance cache, keyed by binding id so superseded bindings
    /// keep their own per-scope instances.
    instances: Mutex<HashMap<u64, Arc<OnceCell<AnyArc>>>>,
    disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl Scope {
    pub(crate) fn new(root: Container, id: u64) -> Self {
        Self {
            id,
            root,
            instances: Mutex::new(HashMap::new()),
            disposers: Mutex::new(DisposeBag::default()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Unique id of this scope within its container.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The container this scope resolves from.
    pub fn container(&self) -> &Container {
        &self.root
    }

    /// Whether this scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Creates a sibling scope with fresh scoped state on the same
    /// container.
    pub fn create_child(&self) -> Scope {
        self.root.create_scope()
    }

    /// Scoped cache lookup with serialized first-time construction per
    /// (binding, scope) pair.
    pub(crate) fn get_or_create(
        &self,
        root: &Container,
        record: &Arc<BindingRecord>,
        name: &'static str,
    ) -> DiResult<AnyArc> {
        if self.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }

        let cell = {
            let mut instances = self.instances.lock().unwrap();
            instances
                .entry(record.id)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        // The map lock is released before construction; only threads
        // racing for the same binding serialize on the cell.
        cell.get_or_try_init(|| construct(root, Some(self), record, name))
            .map(|value| value.clone())
    }

    /// Disposes the scope: runs all queued synchronous teardown hooks in
    /// reverse-construction order, then clears the instance cache.
    ///
    /// Idempotent: only the first call runs the hooks. A hook that
    /// panics is isolated so the remaining hooks still run. Async hooks
    /// require [`dispose_all`](Scope::dispose_all).
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.disposers.lock().unwrap());
        if bag.has_async() {
            eprintln!("[graft-di] Scope has async disposers; call dispose_all().await to run them.");
        }
        bag.run_all_sync_reverse();
        self.instances.lock().unwrap().clear();
    }

    /// Disposes the scope, running async teardown hooks first and then
    /// sync hooks, both in reverse-construction order. Idempotent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ServiceCollection, Dispose, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct RequestCache;
    /// impl Dispose for RequestCache {
    ///     fn dispose(&self) {
    ///         println!("Dropping request cache");
    ///     }
    /// }
    ///
    /// # async fn example() {
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_factory::<RequestCache, _>(|r| {
    ///     let cache = Arc::new(RequestCache);
    ///     r.register_disposer(cache.clone());
    ///     RequestCache
    /// });
    ///
    /// let container = services.build();
    /// let scope = container.create_scope();
    /// let _ = scope.get_required::<RequestCache>();
    /// scope.dispose_all().await;
    /// # }
    /// ```
    pub async fn dispose_all(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.disposers.lock().unwrap());
        bag.run_all_async_reverse().await;
        bag.run_all_sync_reverse();
        self.instances.lock().unwrap().clear();
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        if self.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        with_cycle_guard(key.display_name(), || resolve_one(&self.root, Some(self), key))
    }

    fn resolve_many(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        if self.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        with_cycle_guard(key.display_name(), || {
            resolve_sequence(&self.root, Some(self), key)
        })
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.disposers.lock().unwrap().push_async(move || (f)());
    }
}

impl Resolver for Scope {}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.is_disposed() {
            let bag = self.disposers.get_mut().unwrap();
            if !bag.is_empty() {
                eprintln!(
                    "[graft-di] Scope dropped with undisposed resources. Call dispose() or dispose_all().await before dropping."
                );
            }
        }
    }
}
