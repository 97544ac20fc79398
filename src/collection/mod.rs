//! Service collection: the registration surface.
//!
//! Every `add_*` method reduces to one [`Registry`] installation of a
//! [`Binding`] (lifetime + construction strategy); the collection is the
//! typed sugar a binding collaborator uses to hand the engine its flat
//! list of bindings before resolution begins.

use std::any::TypeId;
use std::sync::Arc;

use crate::cycles;
use crate::descriptors::{ImplDescriptor, ServiceDescriptor};
use crate::error::DiResult;
use crate::key::{key_of, trait_key_of, ServiceKey};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::{Binding, ImplChoice, Registry};
use crate::Container;

pub mod module_system;
pub use module_system::ServiceModule;

/// Builder for a [`Container`]: collects bindings during the
/// single-threaded setup phase, then [`build`](ServiceCollection::build)s
/// the container that serves resolution traffic.
///
/// Re-registering a service identity does not discard the previous
/// binding: it archives it, and collection resolution
/// ([`Resolver::get_all`](crate::Resolver::get_all) /
/// [`get_all_trait`](crate::Resolver::get_all_trait)) keeps returning the
/// archived providers with their own lifetimes and instances.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Resolver};
///
/// struct Config { port: u16 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { port: 8080 });
///
/// let container = services.build();
/// assert_eq!(container.get_required::<Config>().port, 8080);
/// ```
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    /// Installs a binding for an explicit key. All the typed sugar below
    /// funnels through this.
    pub fn register(&mut self, key: ServiceKey, binding: Binding) -> &mut Self {
        self.registry.register(key, binding);
        self
    }

    // ----- Concrete type registrations -----

    /// Registers a prebuilt singleton instance, shared across the entire
    /// container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use graft_di::ServiceCollection;
    /// struct Config {
    ///     database_url: String,
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string(),
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.register(key_of::<T>(), Binding::instance(value))
    }

    /// Registers a singleton factory, invoked once on first request; the
    /// result is cached for the container's life.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use graft_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_singleton_factory::<UserService, _>(|resolver| UserService {
    ///     db: resolver.get_required::<Database>(),
    /// });
    /// ```
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::factory::<T, F>(Lifetime::Singleton, factory))
    }

    /// Registers a scoped factory: one instance per scope, reused within
    /// it. A root-level request falls back to the singleton path.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::factory::<T, F>(Lifetime::Scoped, factory))
    }

    /// Registers a transient factory, invoked on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::factory::<T, F>(Lifetime::Transient, factory))
    }

    // ----- Trait registrations -----

    /// Registers a prebuilt singleton implementation of a trait contract.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use graft_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct StdoutLogger;
    /// impl Logger for StdoutLogger {
    ///     fn log(&self, message: &str) {
    ///         println!("[log] {message}");
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Logger>(Arc::new(StdoutLogger));
    ///
    /// let container = services.build();
    /// container.get_required_trait::<dyn Logger>().log("ready");
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        self.register(trait_key_of::<T>(), Binding::trait_instance(value))
    }

    /// Registers a singleton trait factory.
    pub fn add_singleton_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> Arc<T> + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::trait_factory::<T, F>(Lifetime::Singleton, factory))
    }

    /// Registers a scoped trait factory.
    pub fn add_scoped_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> Arc<T> + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::trait_factory::<T, F>(Lifetime::Scoped, factory))
    }

    /// Registers a transient trait factory.
    pub fn add_transient_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> Arc<T> + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::trait_factory::<T, F>(Lifetime::Transient, factory))
    }

    // ----- Constructor-descriptor registrations -----

    /// Registers a service constructed through its implementation's
    /// constructor descriptor: the richest viable constructor is selected
    /// against the registered services at resolve time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ImplDescriptor, ParamSpec, ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Logger;
    /// struct Widget { logger: Option<Arc<Logger>> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Logger);
    /// services.add_transient_impl::<Widget>(
    ///     ImplDescriptor::for_type::<Widget>()
    ///         .ctor(vec![], |_| Ok(Widget { logger: None }))
    ///         .ctor(vec![ParamSpec::service::<Logger>()], |r| {
    ///             Ok(Widget { logger: Some(r.get::<Logger>()?) })
    ///         })
    ///         .build(),
    /// );
    ///
    /// let container = services.build();
    /// // Logger is registered, so the richer constructor wins.
    /// assert!(container.get_required::<Widget>().logger.is_some());
    /// ```
    pub fn add_singleton_impl<T: 'static>(&mut self, descriptor: ImplDescriptor) -> &mut Self {
        self.register(key_of::<T>(), Binding::constructed(Lifetime::Singleton, descriptor))
    }

    /// Scoped variant of [`add_singleton_impl`](Self::add_singleton_impl).
    pub fn add_scoped_impl<T: 'static>(&mut self, descriptor: ImplDescriptor) -> &mut Self {
        self.register(key_of::<T>(), Binding::constructed(Lifetime::Scoped, descriptor))
    }

    /// Transient variant of [`add_singleton_impl`](Self::add_singleton_impl).
    pub fn add_transient_impl<T: 'static>(&mut self, descriptor: ImplDescriptor) -> &mut Self {
        self.register(key_of::<T>(), Binding::constructed(Lifetime::Transient, descriptor))
    }

    /// Registers a trait contract fulfilled by a constructed
    /// implementation (the `AddSingleton<TService, TImpl>` shape).
    ///
    /// Build the descriptor with
    /// [`ImplDescriptor::for_trait`](crate::ImplDescriptor::for_trait) so
    /// instances are stored behind the contract.
    pub fn add_singleton_trait_impl<T>(&mut self, descriptor: ImplDescriptor) -> &mut Self
    where
        T: ?Sized + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::constructed(Lifetime::Singleton, descriptor))
    }

    /// Scoped variant of [`add_singleton_trait_impl`](Self::add_singleton_trait_impl).
    pub fn add_scoped_trait_impl<T>(&mut self, descriptor: ImplDescriptor) -> &mut Self
    where
        T: ?Sized + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::constructed(Lifetime::Scoped, descriptor))
    }

    /// Transient variant of [`add_singleton_trait_impl`](Self::add_singleton_trait_impl).
    pub fn add_transient_trait_impl<T>(&mut self, descriptor: ImplDescriptor) -> &mut Self
    where
        T: ?Sized + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::constructed(Lifetime::Transient, descriptor))
    }

    // ----- Selector registrations -----

    /// Registers a service whose implementation is chosen at resolve time
    /// among a fixed set of declared candidates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ImplChoice, ImplDescriptor, ServiceCollection, Resolver};
    ///
    /// trait Transport: Send + Sync {
    ///     fn name(&self) -> &'static str;
    /// }
    /// struct Tcp;
    /// impl Transport for Tcp {
    ///     fn name(&self) -> &'static str { "tcp" }
    /// }
    /// struct Udp;
    /// impl Transport for Udp {
    ///     fn name(&self) -> &'static str { "udp" }
    /// }
    ///
    /// let use_tcp = true;
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_trait_selector::<dyn Transport, _>(
    ///     move || {
    ///         if use_tcp { ImplChoice::of::<Tcp>() } else { ImplChoice::of::<Udp>() }
    ///     },
    ///     vec![
    ///         ImplDescriptor::for_trait::<dyn Transport, Tcp, _>(|t| t)
    ///             .ctor(vec![], |_| Ok(Tcp))
    ///             .build(),
    ///         ImplDescriptor::for_trait::<dyn Transport, Udp, _>(|t| t)
    ///             .ctor(vec![], |_| Ok(Udp))
    ///             .build(),
    ///     ],
    /// );
    ///
    /// let container = services.build();
    /// assert_eq!(container.get_required_trait::<dyn Transport>().name(), "tcp");
    /// ```
    pub fn add_singleton_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::selected(Lifetime::Singleton, select, candidates))
    }

    /// Scoped variant of [`add_singleton_selector`](Self::add_singleton_selector).
    pub fn add_scoped_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::selected(Lifetime::Scoped, select, candidates))
    }

    /// Transient variant of [`add_singleton_selector`](Self::add_singleton_selector).
    pub fn add_transient_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(key_of::<T>(), Binding::selected(Lifetime::Transient, select, candidates))
    }

    /// Selector registration for a trait contract.
    pub fn add_singleton_trait_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: ?Sized + 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::selected(Lifetime::Singleton, select, candidates))
    }

    /// Scoped variant of [`add_singleton_trait_selector`](Self::add_singleton_trait_selector).
    pub fn add_scoped_trait_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: ?Sized + 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::selected(Lifetime::Scoped, select, candidates))
    }

    /// Transient variant of [`add_singleton_trait_selector`](Self::add_singleton_trait_selector).
    pub fn add_transient_trait_selector<T, F>(
        &mut self,
        select: F,
        candidates: Vec<ImplDescriptor>,
    ) -> &mut Self
    where
        T: ?Sized + 'static,
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        self.register(trait_key_of::<T>(), Binding::selected(Lifetime::Transient, select, candidates))
    }

    // ----- Family templates -----

    /// Registers a family template for the marker type `F`.
    ///
    /// A request for a parameterized identity with no exact binding is
    /// synthesized through its family's template and the result cached,
    /// so the template runs at most once per concrete instantiation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{Binding, Lifetime, ServiceCollection, Resolver};
    /// use std::any::TypeId;
    /// use std::marker::PhantomData;
    ///
    /// struct Repo<T: Send + Sync + 'static>(PhantomData<T>);
    /// struct RepoOf; // family marker
    /// struct User;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_family::<RepoOf, _>(|key| {
    ///     // Statically known instantiations only; anything else is
    ///     // reported as unregistered.
    ///     if key.type_id() == Some(TypeId::of::<Repo<User>>()) {
    ///         Some(Binding::factory::<Repo<User>, _>(Lifetime::Singleton, |_| {
    ///             Repo(PhantomData)
    ///         }))
    ///     } else {
    ///         None
    ///     }
    /// });
    ///
    /// let container = services.build();
    /// let repo = container.get_parameterized::<Repo<User>, RepoOf>();
    /// assert!(repo.is_ok());
    /// ```
    pub fn add_family<F, T>(&mut self, template: T) -> &mut Self
    where
        F: 'static,
        T: Fn(&ServiceKey) -> Option<Binding> + Send + Sync + 'static,
    {
        self.registry.register_family(TypeId::of::<F>(), Arc::new(template));
        self
    }

    // ----- Conditional registration -----

    /// Registers a singleton only if the type has no binding yet.
    /// Returns whether the registration happened.
    ///
    /// ```rust
    /// use graft_di::ServiceCollection;
    ///
    /// let mut services = ServiceCollection::new();
    /// assert!(services.try_add_singleton(42usize));
    /// assert!(!services.try_add_singleton(100usize)); // already bound
    /// ```
    pub fn try_add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> bool {
        if self.contains::<T>() {
            false
        } else {
            self.add_singleton(value);
            true
        }
    }

    /// Registers a singleton factory only if the type has no binding yet.
    pub fn try_add_singleton_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            false
        } else {
            self.add_singleton_factory(factory);
            true
        }
    }

    /// Registers a scoped factory only if the type has no binding yet.
    pub fn try_add_scoped_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            false
        } else {
            self.add_scoped_factory(factory);
            true
        }
    }

    /// Registers a transient factory only if the type has no binding yet.
    pub fn try_add_transient_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            false
        } else {
            self.add_transient_factory(factory);
            true
        }
    }

    /// Registers a singleton trait implementation only if the contract
    /// has no binding yet.
    pub fn try_add_singleton_trait<T>(&mut self, value: Arc<T>) -> bool
    where
        T: ?Sized + 'static + Send + Sync,
    {
        if self.contains_key(&trait_key_of::<T>()) {
            false
        } else {
            self.add_singleton_trait(value);
            true
        }
    }

    // ----- Introspection -----

    /// Whether a binding exists for the concrete type `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_key(&key_of::<T>())
    }

    /// Whether a binding exists for the given key.
    pub fn contains_key(&self, key: &ServiceKey) -> bool {
        self.registry.contains(key)
    }

    /// Introspection snapshot of all registrations, history included,
    /// sorted by service name.
    pub fn service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.descriptors()
    }

    // ----- Build -----

    /// Builds the container that serves resolution traffic.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ServiceCollection, Resolver};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(42usize);
    ///
    /// let container = services.build();
    /// assert_eq!(*container.get_required::<usize>(), 42);
    /// ```
    pub fn build(self) -> Container {
        Container::new(self.registry)
    }

    /// Builds the container, first failing fast on unsatisfiable
    /// constructors or dependency cycles.
    ///
    /// Equivalent to [`build`](Self::build) followed by
    /// [`Container::validate`](crate::Container::validate), for callers
    /// that want startup to abort instead of surfacing the problem on a
    /// live request.
    pub fn build_validated(self) -> DiResult<Container> {
        cycles::validate(&self.registry)?;
        Ok(Container::new(self.registry))
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}
