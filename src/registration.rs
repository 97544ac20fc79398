//! Bindings and the service registry.

use std::any::{Any, TypeId};
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::descriptors::{ImplDescriptor, ServiceDescriptor, StrategyKind};
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

type FactoryFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;
type SelectFn = Arc<dyn Fn() -> ImplChoice + Send + Sync>;

/// Implementation identity returned by a selector strategy.
///
/// Selectors must pick among their binding's declared candidates;
/// returning anything else fails resolution.
///
/// ```rust
/// use graft_di::ImplChoice;
///
/// struct FastPath;
/// let choice = ImplChoice::of::<FastPath>();
/// assert!(choice.name().contains("FastPath"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplChoice {
    id: TypeId,
    name: &'static str,
}

impl ImplChoice {
    /// The identity of implementation type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// TypeId of the chosen implementation.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Name of the chosen implementation.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Template that synthesizes a binding for a concrete parameterized key.
///
/// Registered per family marker; returning `None` means the template does
/// not cover the requested instantiation.
pub type FamilyTemplate = Arc<dyn Fn(&ServiceKey) -> Option<Binding> + Send + Sync>;

/// How a binding produces instances.
#[derive(Clone)]
pub(crate) enum Strategy {
    /// Prebuilt instance, shared as-is.
    Instance(AnyArc),
    /// Opaque user factory.
    Factory(FactoryFn),
    /// Constructor resolution through a descriptor.
    Constructor(Arc<ImplDescriptor>),
    /// Implementation chosen at resolve time among declared candidates.
    Selector {
        select: SelectFn,
        candidates: Arc<Vec<ImplDescriptor>>,
    },
}

impl Strategy {
    pub(crate) fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Instance(_) => StrategyKind::Instance,
            Strategy::Factory(_) => StrategyKind::Factory,
            Strategy::Constructor(_) => StrategyKind::Constructor,
            Strategy::Selector { .. } => StrategyKind::Selector,
        }
    }

    fn impl_info(&self) -> (Option<TypeId>, Option<&'static str>) {
        match self {
            Strategy::Constructor(desc) => (Some(desc.type_id()), Some(desc.type_name())),
            _ => (None, None),
        }
    }
}

/// A registered rule telling the engine how to produce instances for one
/// service identity: a lifetime plus a construction strategy.
///
/// Every registration method on [`ServiceCollection`](crate::ServiceCollection)
/// reduces to one `Binding` handed to the registry; the same constructors
/// are available for late registration through
/// [`Container::register`](crate::Container::register).
///
/// # Examples
///
/// ```rust
/// use graft_di::{Binding, Lifetime, key_of, ServiceCollection, Resolver};
///
/// let mut services = ServiceCollection::new();
/// services.register(key_of::<u32>(), Binding::instance(7u32));
/// services.register(
///     key_of::<String>(),
///     Binding::factory::<String, _>(Lifetime::Transient, |_| "fresh".to_string()),
/// );
///
/// let container = services.build();
/// assert_eq!(*container.get_required::<u32>(), 7);
/// assert_eq!(&*container.get_required::<String>(), "fresh");
/// ```
pub struct Binding {
    pub(crate) lifetime: Lifetime,
    pub(crate) strategy: Strategy,
}

impl Binding {
    /// A prebuilt singleton instance.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            lifetime: Lifetime::Singleton,
            strategy: Strategy::Instance(Arc::new(value)),
        }
    }

    /// A prebuilt singleton trait instance.
    pub fn trait_instance<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> Self {
        // Stored as Arc<Arc<dyn S>> inside the erased Any.
        Self {
            lifetime: Lifetime::Singleton,
            strategy: Strategy::Instance(Arc::new(value) as AnyArc),
        }
    }

    /// A user factory producing a concrete type.
    pub fn factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> T + Send + Sync + 'static,
    {
        Self {
            lifetime,
            strategy: Strategy::Factory(Arc::new(move |r: &ResolverContext<'_>| {
                Ok(Arc::new(factory(r)) as AnyArc)
            })),
        }
    }

    /// A user factory producing a trait object.
    pub fn trait_factory<S, F>(lifetime: Lifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> Arc<S> + Send + Sync + 'static,
    {
        Self {
            lifetime,
            strategy: Strategy::Factory(Arc::new(move |r: &ResolverContext<'_>| {
                Ok(Arc::new(factory(r)) as AnyArc)
            })),
        }
    }

    /// Construction through the implementation's constructor descriptor.
    pub fn constructed(lifetime: Lifetime, descriptor: ImplDescriptor) -> Self {
        Self {
            lifetime,
            strategy: Strategy::Constructor(Arc::new(descriptor)),
        }
    }

    /// Implementation chosen at resolve time among `candidates`.
    ///
    /// The selector must return the [`ImplChoice`] of one declared
    /// candidate; anything else fails resolution with
    /// [`DiError::UndeclaredImplementation`](crate::DiError::UndeclaredImplementation).
    pub fn selected<F>(lifetime: Lifetime, select: F, candidates: Vec<ImplDescriptor>) -> Self
    where
        F: Fn() -> ImplChoice + Send + Sync + 'static,
    {
        Self {
            lifetime,
            strategy: Strategy::Selector {
                select: Arc::new(select),
                candidates: Arc::new(candidates),
            },
        }
    }

    /// The binding's lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The construction strategy backing this binding.
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}

/// A binding installed in the registry, with its runtime slots.
///
/// Each record keeps its own singleton slot; scoped instances are cached
/// per scope under the record's id. Archiving a record on re-registration
/// therefore carries its already-created instances along.
pub(crate) struct BindingRecord {
    pub(crate) id: u64,
    pub(crate) lifetime: Lifetime,
    pub(crate) strategy: Strategy,
    /// Singleton slot. Initialization is serialized per record, which
    /// upholds the at-most-one-instance invariant under concurrent first
    /// access. Also hosts the singleton fallback for scoped services
    /// requested without a scope.
    pub(crate) single: OnceCell<AnyArc>,
}

/// Active binding plus the append-only history of superseded ones,
/// most-recently-superseded first.
pub(crate) struct RegistryEntry {
    pub(crate) active: Arc<BindingRecord>,
    pub(crate) history: Vec<Arc<BindingRecord>>,
}

/// Service registry: one mapping from identity to binding chain, owned by
/// the container. Registration is expected to complete during a
/// single-threaded setup phase before resolution begins.
pub(crate) struct Registry {
    entries: HashMap<ServiceKey, RegistryEntry>,
    families: HashMap<TypeId, FamilyTemplate>,
    next_binding_id: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            families: HashMap::new(),
            next_binding_id: 0,
        }
    }

    fn wrap(&mut self, binding: Binding) -> Arc<BindingRecord> {
        let id = self.next_binding_id;
        self.next_binding_id += 1;
        Arc::new(BindingRecord {
            id,
            lifetime: binding.lifetime,
            strategy: binding.strategy,
            single: OnceCell::new(),
        })
    }

    /// Installs a binding. Re-registering an identity archives the
    /// previous record (instances and all) rather than dropping it.
    pub(crate) fn register(&mut self, key: ServiceKey, binding: Binding) {
        let record = self.wrap(binding);
        match self.entries.entry(key) {
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let superseded = std::mem::replace(&mut entry.active, record);
                entry.history.insert(0, superseded);
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(RegistryEntry { active: record, history: Vec::new() });
            }
        }
    }

    pub(crate) fn register_family(&mut self, family: TypeId, template: FamilyTemplate) {
        self.families.insert(family, template);
    }

    /// The active binding for an identity.
    pub(crate) fn get_active(&self, key: &ServiceKey) -> Option<Arc<BindingRecord>> {
        self.entries.get(key).map(|entry| entry.active.clone())
    }

    /// Active binding plus history, most-recently-superseded first.
    pub(crate) fn get_all(&self, key: &ServiceKey) -> Vec<Arc<BindingRecord>> {
        match self.entries.get(key) {
            Some(entry) => {
                let mut records = Vec::with_capacity(1 + entry.history.len());
                records.push(entry.active.clone());
                records.extend(entry.history.iter().cloned());
                records
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn family_template(&self, family: TypeId) -> Option<FamilyTemplate> {
        self.families.get(&family).cloned()
    }

    pub(crate) fn has_template_for(&self, key: &ServiceKey) -> bool {
        key.family()
            .map(|(family, _)| self.families.contains_key(&family))
            .unwrap_or(false)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ServiceKey, &RegistryEntry)> {
        self.entries.iter()
    }

    /// Introspection snapshot, sorted by service name for determinism.
    pub(crate) fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors = Vec::new();
        for (key, entry) in &self.entries {
            let mut push = |record: &BindingRecord, superseded: bool| {
                let (impl_type_id, impl_type_name) = record.strategy.impl_info();
                descriptors.push(ServiceDescriptor {
                    key: key.clone(),
                    lifetime: record.lifetime,
                    kind: record.strategy.kind(),
                    impl_type_id,
                    impl_type_name,
                    superseded,
                });
            };
            push(&entry.active, false);
            for superseded in &entry.history {
                push(superseded, true);
            }
        }
        descriptors.sort_by_key(|d| (d.type_name(), d.superseded));
        descriptors
    }
}
