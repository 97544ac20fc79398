//! Container and root resolution.
//!
//! The [`Container`] owns the registry and hosts singleton instances; it
//! is the root resolver every scope delegates to. Resolution dispatch for
//! all lifetimes lives here so the container and scopes share one engine.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::cycles;
use crate::descriptors::{ImplDescriptor, ServiceDescriptor};
use crate::error::{DiError, DiResult};
use crate::internal::{with_cycle_guard, BoxFutureUnit, DisposeBag};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Binding, BindingRecord, Registry, Strategy};
use crate::selector::select_constructor;
use crate::traits::{Resolver, ResolverCore};

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::Scope;

/// The dependency injection container: registry owner, singleton host,
/// and root resolver.
///
/// Cloning is cheap (`Arc`-shared) and clones refer to the same
/// container. Multiple containers coexist without sharing any state.
///
/// # Thread safety
///
/// Resolution may run concurrently from any number of threads. First-time
/// singleton construction is serialized per identity so exactly one
/// instance is ever created. Registration through
/// [`register`](Container::register) is supported but intended for a
/// single-threaded setup phase before resolution traffic begins.
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
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let container = services.build();
/// let user_service = container.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) registry: RwLock<Registry>,
    pub(crate) root_disposers: Mutex<DisposeBag>,
    pub(crate) next_scope_id: AtomicU64,
}

impl Container {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: RwLock::new(registry),
                root_disposers: Mutex::new(DisposeBag::default()),
                next_scope_id: AtomicU64::new(1),
            }),
        }
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Scoped services are cached per scope; each scope has a unique id
    /// and its own disposal list, torn down by
    /// [`Scope::dispose`](crate::Scope::dispose).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(u32);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_factory::<RequestId, _>(|_| RequestId(7));
    ///
    /// let container = services.build();
    /// let scope_a = container.create_scope();
    /// let scope_b = container.create_scope();
    /// assert_ne!(scope_a.id(), scope_b.id());
    ///
    /// let a1 = scope_a.get_required::<RequestId>();
    /// let a2 = scope_a.get_required::<RequestId>();
    /// let b = scope_b.get_required::<RequestId>();
    /// assert!(Arc::ptr_eq(&a1, &a2)); // Same scope, same instance
    /// assert!(!Arc::ptr_eq(&a1, &b)); // Different scopes, different instances
    /// ```
    pub fn create_scope(&self) -> Scope {
        let id = self.inner.next_scope_id.fetch_add(1, Ordering::Relaxed);
        Scope::new(self.clone(), id)
    }

    /// Installs a binding directly, bypassing the typed sugar on
    /// [`ServiceCollection`](crate::ServiceCollection).
    ///
    /// Re-registering an identity archives the previous binding, along
    /// with any singleton instance it already created and its scoped
    /// caches, so collection resolution keeps returning it. Registration
    /// is not designed to race with resolution; complete it during
    /// single-threaded setup.
    pub fn register(&self, key: ServiceKey, binding: Binding) {
        self.inner.registry.write().unwrap().register(key, binding);
    }

    /// Registers a family template for the marker type `F`, used to
    /// synthesize bindings for parameterized identities that have no
    /// exact registration.
    pub fn register_family<F, T>(&self, template: T)
    where
        F: 'static,
        T: Fn(&ServiceKey) -> Option<Binding> + Send + Sync + 'static,
    {
        self.inner
            .registry
            .write()
            .unwrap()
            .register_family(TypeId::of::<F>(), Arc::new(template));
    }

    /// Dynamic resolution by key: `Ok(None)` when the identity is not
    /// registered, the neutral empty sequence for unregistered collection
    /// requests, and errors only for actual resolution failures.
    pub fn get_service(
        &self,
        key: &ServiceKey,
    ) -> DiResult<Option<Arc<dyn std::any::Any + Send + Sync>>> {
        match self.resolve_any(key) {
            Ok(value) => Ok(Some(value)),
            Err(DiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Names of every registered service involved in a dependency cycle.
    ///
    /// Advisory and off the hot path: run it once after registration,
    /// not per request. Factory-backed bindings are treated as opaque.
    pub fn find_cycles(&self) -> Vec<&'static str> {
        cycles::find_cycles(&self.inner.registry.read().unwrap())
    }

    /// Fail-fast startup validation: every constructor-strategy binding
    /// must have a viable constructor and the graph must be acyclic.
    pub fn validate(&self) -> DiResult<()> {
        cycles::validate(&self.inner.registry.read().unwrap())
    }

    /// Introspection snapshot of all registrations, history included.
    pub fn service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner.registry.read().unwrap().descriptors()
    }

    /// Runs all synchronous root disposal hooks in LIFO order, exactly
    /// once. Async hooks require [`dispose_all`](Container::dispose_all).
    pub fn dispose(&self) {
        let mut bag = std::mem::take(&mut *self.inner.root_disposers.lock().unwrap());
        if bag.has_async() {
            eprintln!(
                "[graft-di] Container has async disposers; call dispose_all().await to run them."
            );
        }
        bag.run_all_sync_reverse();
    }

    /// Runs all root disposal hooks: async first, then sync, both in LIFO
    /// order. Idempotent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ServiceCollection, Dispose, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Cache;
    /// impl Dispose for Cache {
    ///     fn dispose(&self) {
    ///         println!("Cache disposed");
    ///     }
    /// }
    ///
    /// # async fn example() {
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_factory::<Cache, _>(|r| {
    ///     let cache = Arc::new(Cache);
    ///     r.register_disposer(cache.clone());
    ///     Cache
    /// });
    ///
    /// let container = services.build();
    /// let _ = container.get_required::<Cache>();
    /// container.dispose_all().await;
    /// # }
    /// ```
    pub async fn dispose_all(&self) {
        let mut bag = std::mem::take(&mut *self.inner.root_disposers.lock().unwrap());
        bag.run_all_async_reverse().await;
        bag.run_all_sync_reverse();
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        for (key, entry) in self.inner.registry.read().unwrap().iter() {
            s.push_str(&format!(
                "  {}: {:?} (+{} superseded)\n",
                key.display_name(),
                entry.active.lifetime,
                entry.history.len()
            ));
        }
        s
    }

    /// Active binding lookup with family-template fallback: exact match
    /// first, then a binding synthesized from the key's family template
    /// and cached in the registry for subsequent requests.
    pub(crate) fn record_for(&self, key: &ServiceKey) -> DiResult<Arc<BindingRecord>> {
        if let Some(record) = self.inner.registry.read().unwrap().get_active(key) {
            return Ok(record);
        }

        if let Some((family, _)) = key.family() {
            let template = self.inner.registry.read().unwrap().family_template(family);
            if let Some(template) = template {
                if let Some(binding) = template(key) {
                    let mut registry = self.inner.registry.write().unwrap();
                    // A racing synthesis may have installed it already.
                    if let Some(record) = registry.get_active(key) {
                        return Ok(record);
                    }
                    registry.register(key.clone(), binding);
                    if let Some(record) = registry.get_active(key) {
                        return Ok(record);
                    }
                }
            }
        }

        Err(DiError::NotFound(key.display_name()))
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            if let Ok(bag) = self.inner.root_disposers.try_lock() {
                if !bag.is_empty() {
                    eprintln!(
                        "[graft-di] Container dropped with undisposed resources. Call dispose() or dispose_all().await before dropping."
                    );
                }
            }
        }
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        with_cycle_guard(key.display_name(), || resolve_one(self, None, key))
    }

    fn resolve_many(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        with_cycle_guard(key.display_name(), || resolve_sequence(self, None, key))
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.root_disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner.root_disposers.lock().unwrap().push_async(move || (f)());
    }
}

impl Resolver for Container {}

// ===== Shared resolution engine =====

/// Resolves one request. Collection keys resolve to the full provider
/// sequence as a single erased value; everything else dispatches on the
/// active binding's lifetime.
pub(crate) fn resolve_one(
    root: &Container,
    scope: Option<&Scope>,
    key: &ServiceKey,
) -> DiResult<AnyArc> {
    if let Some(element) = key.element_key() {
        let sequence = resolve_sequence(root, scope, &element)?;
        return Ok(Arc::new(sequence) as AnyArc);
    }

    let record = root.record_for(key)?;
    cached_per_lifetime(root, scope, &record, key.display_name())
}

/// Resolves every binding for an element identity: active first, then
/// history, most-recently-superseded first, each honoring its own
/// lifetime. New registrations show up in the next enumeration, so the
/// sequence is never cached.
pub(crate) fn resolve_sequence(
    root: &Container,
    scope: Option<&Scope>,
    element: &ServiceKey,
) -> DiResult<Vec<AnyArc>> {
    let records = root.inner.registry.read().unwrap().get_all(element);
    let name = element.display_name();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        out.push(cached_per_lifetime(root, scope, &record, name)?);
    }
    Ok(out)
}

fn cached_per_lifetime(
    root: &Container,
    scope: Option<&Scope>,
    record: &Arc<BindingRecord>,
    name: &'static str,
) -> DiResult<AnyArc> {
    match record.lifetime {
        Lifetime::Transient => construct(root, scope, record, name),
        Lifetime::Scoped => match scope {
            Some(scope) => scope.get_or_create(root, record, name),
            // Root-level request for a scoped service: documented
            // fallback to the singleton path, not an error.
            None => singleton_slot(root, record, name),
        },
        Lifetime::Singleton => singleton_slot(root, record, name),
    }
}

/// Serialized first-time construction per record: concurrent first access
/// blocks on the slot, so at most one instance is ever created.
fn singleton_slot(
    root: &Container,
    record: &Arc<BindingRecord>,
    name: &'static str,
) -> DiResult<AnyArc> {
    record
        .single
        .get_or_try_init(|| construct(root, None, record, name))
        .map(|value| value.clone())
}

/// Invokes the record's construction strategy against the current
/// resolver (the scope when present, else the container), so nested
/// dependencies cache in the right place and disposal hooks attach to
/// the right lifetime boundary.
pub(crate) fn construct(
    root: &Container,
    scope: Option<&Scope>,
    record: &BindingRecord,
    service: &'static str,
) -> DiResult<AnyArc> {
    match &record.strategy {
        Strategy::Instance(value) => Ok(value.clone()),
        Strategy::Factory(factory) => invoke_in_context(root, scope, |ctx| factory(ctx)),
        Strategy::Constructor(desc) => construct_descriptor(root, scope, desc.as_ref()),
        Strategy::Selector { select, candidates } => {
            let choice = select();
            let candidate = candidates
                .iter()
                .find(|candidate| candidate.type_id() == choice.id())
                .ok_or(DiError::UndeclaredImplementation {
                    service,
                    implementation: choice.name(),
                })?;
            construct_descriptor(root, scope, candidate)
        }
    }
}

fn construct_descriptor(
    root: &Container,
    scope: Option<&Scope>,
    desc: &ImplDescriptor,
) -> DiResult<AnyArc> {
    // Selection queries the registry; the lock is released before the
    // constructor runs so user code never executes under it.
    let ctor = {
        let registry = root.inner.registry.read().unwrap();
        select_constructor(desc, &registry)?
    };
    invoke_in_context(root, scope, |ctx| (ctor.construct)(ctx))
}

fn invoke_in_context<R>(
    root: &Container,
    scope: Option<&Scope>,
    f: impl FnOnce(&ResolverContext<'_>) -> R,
) -> R {
    match scope {
        Some(scope) => f(&ResolverContext::new(scope)),
        None => f(&ResolverContext::new(root)),
    }
}
