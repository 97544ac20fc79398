//! Service identity keys for the dependency injection container.

use std::any::TypeId;

/// Identity of a bindable service.
///
/// A `ServiceKey` uniquely identifies a service contract in the registry.
/// Keys are cheap to clone and compare; equality is structural over the
/// underlying type identity (or the trait name for trait objects, which
/// carry no usable `TypeId` once erased behind `Arc<dyn Trait>`).
///
/// # Key variants
///
/// - **Type**: a concrete type (struct, enum, primitive)
/// - **Trait**: a single `dyn Trait` contract
/// - **TypeAll** / **TraitAll**: a collection request, "all providers of
///   the element identity", current and superseded
/// - **Parameterized**: a concrete instantiation of a generic service,
///   carrying its *family* marker so resolution can fall back to a family
///   template when no exact binding exists
///
/// # Examples
///
/// ```rust
/// use graft_di::{key_of, all_of};
///
/// let key = key_of::<u32>();
/// assert_eq!(key, key_of::<u32>());
/// assert!(!key.is_collection());
///
/// let all = all_of::<u32>();
/// assert!(all.is_collection());
/// assert_eq!(all.element_key(), Some(key_of::<u32>()));
/// ```
#[derive(Debug, Clone)]
pub enum ServiceKey {
    /// Concrete type identity with TypeId and name for diagnostics.
    Type(TypeId, &'static str),
    /// Trait object identity. Only the name is stored; erased trait
    /// objects are compared by their `type_name`.
    Trait(&'static str),
    /// Collection request over a concrete element type.
    TypeAll(TypeId, &'static str),
    /// Collection request over a trait element.
    TraitAll(&'static str),
    /// Concrete instantiation of a generic service, with the family
    /// marker used for template fallback.
    Parameterized {
        /// TypeId of the closed (fully parameterized) type.
        id: TypeId,
        /// Name of the closed type.
        name: &'static str,
        /// TypeId of the family marker type.
        family: TypeId,
        /// Name of the family marker type.
        family_name: &'static str,
    },
}

impl ServiceKey {
    /// Type or trait name for display and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKey::Type(_, name) => name,
            ServiceKey::Trait(name) => name,
            ServiceKey::TypeAll(_, name) => name,
            ServiceKey::TraitAll(name) => name,
            ServiceKey::Parameterized { name, .. } => name,
        }
    }

    /// Whether this key denotes "all providers of T" rather than a single
    /// service.
    pub fn is_collection(&self) -> bool {
        matches!(self, ServiceKey::TypeAll(_, _) | ServiceKey::TraitAll(_))
    }

    /// For collection keys, the identity of a single element.
    pub fn element_key(&self) -> Option<ServiceKey> {
        match self {
            ServiceKey::TypeAll(id, name) => Some(ServiceKey::Type(*id, name)),
            ServiceKey::TraitAll(name) => Some(ServiceKey::Trait(name)),
            _ => None,
        }
    }

    /// The family marker for parameterized keys.
    pub fn family(&self) -> Option<(TypeId, &'static str)> {
        match self {
            ServiceKey::Parameterized { family, family_name, .. } => Some((*family, family_name)),
            _ => None,
        }
    }

    /// The exact TypeId, where one exists.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            ServiceKey::Type(id, _) => Some(*id),
            ServiceKey::TypeAll(id, _) => Some(*id),
            ServiceKey::Parameterized { id, .. } => Some(*id),
            ServiceKey::Trait(_) | ServiceKey::TraitAll(_) => None,
        }
    }
}

// A Parameterized key and a plain Type key for the same closed type must
// collide in the registry map: exact matches always win over family
// synthesis, regardless of which form the caller used.
impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ServiceKey::Type(a, _), ServiceKey::Type(b, _)) => a == b,
            (ServiceKey::Type(a, _), ServiceKey::Parameterized { id: b, .. }) => a == b,
            (ServiceKey::Parameterized { id: a, .. }, ServiceKey::Type(b, _)) => a == b,
            (ServiceKey::Parameterized { id: a, .. }, ServiceKey::Parameterized { id: b, .. }) => {
                a == b
            }
            (ServiceKey::Trait(a), ServiceKey::Trait(b)) => a == b,
            (ServiceKey::TypeAll(a, _), ServiceKey::TypeAll(b, _)) => a == b,
            (ServiceKey::TraitAll(a), ServiceKey::TraitAll(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl std::hash::Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            // Type and Parameterized share a discriminant on purpose; see
            // the PartialEq note above.
            ServiceKey::Type(id, _) | ServiceKey::Parameterized { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            ServiceKey::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            ServiceKey::TypeAll(id, _) => {
                2u8.hash(state);
                id.hash(state);
            }
            ServiceKey::TraitAll(name) => {
                3u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Key for a concrete service type.
#[inline(always)]
pub fn key_of<T: 'static>() -> ServiceKey {
    ServiceKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait contract (`dyn Trait`).
#[inline(always)]
pub fn trait_key_of<T: ?Sized + 'static>() -> ServiceKey {
    ServiceKey::Trait(std::any::type_name::<T>())
}

/// Collection key: all providers of the concrete type `T`.
#[inline(always)]
pub fn all_of<T: 'static>() -> ServiceKey {
    ServiceKey::TypeAll(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Collection key: all providers of `dyn Trait`.
#[inline(always)]
pub fn trait_all_of<T: ?Sized + 'static>() -> ServiceKey {
    ServiceKey::TraitAll(std::any::type_name::<T>())
}

/// Key for a closed generic service `T` belonging to family `F`.
///
/// `F` is a marker type standing in for the open generic definition;
/// resolution falls back to the family template registered for `F` when
/// no exact binding for `T` exists.
///
/// ```rust
/// use graft_di::{parameterized_key_of, key_of};
///
/// struct PoolOf; // family marker for Pool<T>
/// struct Pool<T>(std::marker::PhantomData<T>);
///
/// let key = parameterized_key_of::<Pool<u32>, PoolOf>();
/// // Exact identity wins: the parameterized key matches a plain binding
/// // for the same closed type.
/// assert_eq!(key, key_of::<Pool<u32>>());
/// ```
#[inline(always)]
pub fn parameterized_key_of<T: 'static, F: 'static>() -> ServiceKey {
    ServiceKey::Parameterized {
        id: TypeId::of::<T>(),
        name: std::any::type_name::<T>(),
        family: TypeId::of::<F>(),
        family_name: std::any::type_name::<F>(),
    }
}
