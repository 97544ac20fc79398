//! Constructor descriptors and service introspection.
//!
//! Rust has no runtime reflection, so "resolve the implementation's
//! constructor" is expressed as data: an [`ImplDescriptor`] lists an
//! implementation's candidate constructors, each carrying its parameter
//! identities and an invocation closure. The constructor selector picks
//! among candidates at resolve time exactly the way a reflective
//! container would pick among `public` constructors.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{key_of, parameterized_key_of, trait_key_of, ServiceKey};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;
use crate::traits::{Dispose, ResolverCore};

/// Identity of one constructor parameter (or injected member).
///
/// Used by the constructor selector to decide viability and by the cycle
/// detector to walk the dependency graph. The invocation closure performs
/// the actual recursive resolution; the declared parameters must agree
/// with what the closure resolves.
#[derive(Debug, Clone)]
pub enum ParamSpec {
    /// A single service dependency.
    Service(ServiceKey),
    /// All providers of the element identity. Satisfiable only when at
    /// least one provider is registered.
    Collection(ServiceKey),
    /// The current resolver itself. Always satisfiable and never walked
    /// as a graph edge.
    Resolver,
}

impl ParamSpec {
    /// Dependency on a concrete service type.
    pub fn service<T: 'static>() -> Self {
        ParamSpec::Service(key_of::<T>())
    }

    /// Dependency on a trait contract.
    pub fn service_trait<T: ?Sized + 'static>() -> Self {
        ParamSpec::Service(trait_key_of::<T>())
    }

    /// Dependency on a closed generic service with family fallback.
    pub fn parameterized<T: 'static, F: 'static>() -> Self {
        ParamSpec::Service(parameterized_key_of::<T, F>())
    }

    /// Dependency on every provider of a concrete element type.
    pub fn collection<T: 'static>() -> Self {
        ParamSpec::Collection(key_of::<T>())
    }

    /// Dependency on every provider of a trait element.
    pub fn collection_trait<T: ?Sized + 'static>() -> Self {
        ParamSpec::Collection(trait_key_of::<T>())
    }

    /// The current resolver, bound directly rather than resolved.
    pub fn resolver() -> Self {
        ParamSpec::Resolver
    }

    /// The service key this parameter depends on, if any.
    pub fn key(&self) -> Option<&ServiceKey> {
        match self {
            ParamSpec::Service(key) | ParamSpec::Collection(key) => Some(key),
            ParamSpec::Resolver => None,
        }
    }
}

pub(crate) type ErasedCtor =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// One candidate constructor: parameter identities plus the invocation
/// closure that resolves them and produces the erased instance.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) construct: ErasedCtor,
}

impl ConstructorDescriptor {
    /// Declared parameters, in order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

/// Describes how to construct one implementation type.
///
/// Candidate constructors are kept in declaration order; the selector
/// prefers the viable constructor with the most parameters, breaking ties
/// by declaration order. A descriptor with no constructors models an
/// abstract implementation and always fails selection.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ImplDescriptor, ParamSpec, Resolver};
/// use std::sync::Arc;
///
/// struct Logger;
/// struct Widget { logger: Option<Arc<Logger>> }
///
/// let descriptor = ImplDescriptor::for_type::<Widget>()
///     .ctor(vec![], |_| Ok(Widget { logger: None }))
///     .ctor(vec![ParamSpec::service::<Logger>()], |r| {
///         Ok(Widget { logger: Some(r.get::<Logger>()?) })
///     })
///     .build();
/// assert_eq!(descriptor.constructors().len(), 2);
/// ```
#[derive(Clone)]
pub struct ImplDescriptor {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) ctors: Vec<ConstructorDescriptor>,
    pub(crate) member_params: Vec<ParamSpec>,
}

impl ImplDescriptor {
    /// Starts a descriptor for a concrete implementation stored as itself.
    pub fn for_type<T: Send + Sync + 'static>() -> ImplBuilder<T> {
        ImplBuilder::new(Arc::new(|instance: Arc<T>| instance as AnyArc))
    }

    /// Starts a descriptor for an implementation exposed behind a trait
    /// contract.
    ///
    /// The `cast` closure performs the unsize coercion; at the call site
    /// it is simply `|t| t`:
    ///
    /// ```rust
    /// use graft_di::ImplDescriptor;
    ///
    /// trait Greeter: Send + Sync { fn hello(&self) -> &'static str; }
    /// struct English;
    /// impl Greeter for English { fn hello(&self) -> &'static str { "hello" } }
    ///
    /// let descriptor = ImplDescriptor::for_trait::<dyn Greeter, English, _>(|t| t)
    ///     .ctor(vec![], |_| Ok(English))
    ///     .build();
    /// assert!(descriptor.type_name().contains("English"));
    /// ```
    pub fn for_trait<S, T, C>(cast: C) -> ImplBuilder<T>
    where
        S: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        // Trait instances are stored as Arc<Arc<dyn S>> inside the erased
        // Any, matching how trait factories store theirs.
        ImplBuilder::new(Arc::new(move |instance: Arc<T>| {
            Arc::new(cast(instance)) as AnyArc
        }))
    }

    /// TypeId of the implementation.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the implementation type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Candidate constructors in declaration order.
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.ctors
    }

    /// Parameter identities of the settable injected members.
    pub fn member_params(&self) -> &[ParamSpec] {
        &self.member_params
    }
}

type TypedCtor<T> = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync>;
type TypedMember<T> =
    Arc<dyn for<'a> Fn(&Arc<T>, &ResolverContext<'a>) -> DiResult<()> + Send + Sync>;
type TypedTeardown<T> = Arc<dyn for<'a> Fn(&Arc<T>, &ResolverContext<'a>) + Send + Sync>;
type Erase<T> = Arc<dyn Fn(Arc<T>) -> AnyArc + Send + Sync>;

/// Builder for [`ImplDescriptor`].
///
/// Construction order at resolve time: invoke the selected constructor,
/// populate the settable members in declaration order, attach the
/// disposal hook if one was declared, then erase for storage.
pub struct ImplBuilder<T: Send + Sync + 'static> {
    type_name: &'static str,
    erase: Erase<T>,
    ctors: Vec<(Vec<ParamSpec>, TypedCtor<T>)>,
    members: Vec<(ParamSpec, TypedMember<T>)>,
    teardown: Option<TypedTeardown<T>>,
}

impl<T: Send + Sync + 'static> ImplBuilder<T> {
    fn new(erase: Erase<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            erase,
            ctors: Vec::new(),
            members: Vec::new(),
            teardown: None,
        }
    }

    /// Declares a candidate constructor.
    ///
    /// `params` must list the identities the `make` closure resolves;
    /// viability and cycle analysis work off that list.
    pub fn ctor<F>(mut self, params: Vec<ParamSpec>, make: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.ctors.push((params, Arc::new(make)));
        self
    }

    /// Declares a settable injected member, populated after construction.
    ///
    /// The member itself needs interior mutability (e.g. `OnceLock`)
    /// since instances are shared behind `Arc` by the time injection
    /// runs.
    pub fn member<F>(mut self, param: ParamSpec, inject: F) -> Self
    where
        F: for<'a> Fn(&T, &ResolverContext<'a>) -> DiResult<()> + Send + Sync + 'static,
    {
        self.members.push((
            param,
            Arc::new(move |instance: &Arc<T>, r: &ResolverContext<'_>| {
                inject(instance.as_ref(), r)
            }),
        ));
        self
    }

    /// Declares that instances expose the [`Dispose`] contract and must
    /// be torn down with their owning scope (or the container, for
    /// singletons).
    pub fn dispose_on_teardown(mut self) -> Self
    where
        T: Dispose,
    {
        self.teardown = Some(Arc::new(|instance: &Arc<T>, r: &ResolverContext<'_>| {
            let instance = instance.clone();
            r.push_sync_disposer(Box::new(move || instance.dispose()));
        }));
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> ImplDescriptor {
        let ImplBuilder { type_name, erase, ctors, members, teardown } = self;
        let member_params: Vec<ParamSpec> = members.iter().map(|(p, _)| p.clone()).collect();
        let members = Arc::new(members);

        let ctors = ctors
            .into_iter()
            .map(|(params, make)| {
                let members = members.clone();
                let teardown = teardown.clone();
                let erase = erase.clone();
                let construct: ErasedCtor = Arc::new(move |r: &ResolverContext<'_>| {
                    let instance = Arc::new(make(r)?);
                    for (_, inject) in members.iter() {
                        inject(&instance, r)?;
                    }
                    if let Some(hook) = &teardown {
                        hook(&instance, r);
                    }
                    Ok(erase(instance))
                });
                ConstructorDescriptor { params, construct }
            })
            .collect();

        ImplDescriptor {
            type_id: TypeId::of::<T>(),
            type_name,
            ctors,
            member_params,
        }
    }
}

/// Which construction strategy backs a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// A prebuilt instance.
    Instance,
    /// An opaque user factory.
    Factory,
    /// Constructor resolution through an [`ImplDescriptor`].
    Constructor,
    /// Implementation chosen at resolve time among declared candidates.
    Selector,
}

/// Service registration metadata for introspection and diagnostics.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ServiceCollection, Lifetime, StrategyKind};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42u32);
/// services.add_scoped_factory::<String, _>(|_| "hello".to_string());
///
/// let descriptors = services.service_descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let num = descriptors.iter().find(|d| d.type_name() == "u32").unwrap();
/// assert_eq!(num.lifetime, Lifetime::Singleton);
/// assert_eq!(num.kind, StrategyKind::Instance);
/// assert!(!num.superseded);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service identity.
    pub key: ServiceKey,
    /// Registered lifetime.
    pub lifetime: Lifetime,
    /// Construction strategy backing the binding.
    pub kind: StrategyKind,
    /// Implementation type ID, when the strategy knows it.
    pub impl_type_id: Option<TypeId>,
    /// Implementation type name, when the strategy knows it.
    pub impl_type_name: Option<&'static str>,
    /// Whether this binding has been superseded by a later registration.
    pub superseded: bool,
}

impl ServiceDescriptor {
    /// The service type/trait name.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }
}
