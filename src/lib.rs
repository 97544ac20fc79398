//! # graft-di
//!
//! Lifetime-aware dependency injection runtime for Rust: a binding
//! registry with override history, scoped lifetimes, constructor
//! selection, and cycle detection.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Scoped, and Transient services
//! - **Override history**: re-registering a service archives the previous
//!   binding; collection resolution returns current and superseded
//!   providers, each honoring its own lifetime
//! - **Constructor selection**: implementations declare candidate
//!   constructors as descriptors; the richest viable one is chosen
//!   against the registered services
//! - **Cycle detection**: an advisory validation pass reports every
//!   service on a dependency cycle before the first live request, and a
//!   runtime guard stops cyclic resolutions with the full path
//! - **Deterministic teardown**: scope disposal runs hooks exactly once,
//!   in reverse-construction order, isolating failures
//! - **Thread-safe**: `Arc`-based sharing; singleton construction is
//!   serialized per identity
//!
//! ## Quick start
//!
//! ```rust
//! use graft_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|resolver| UserService {
//!     db: resolver.get_required::<Database>(),
//! });
//!
//! let container = services.build();
//! let user_service = container.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service lifetimes
//!
//! - **Singleton**: created once, shared for the container's life
//! - **Scoped**: created once per scope (request contexts); root-level
//!   requests fall back to the singleton path
//! - **Transient**: created fresh on every resolution
//!
//! ## Trait resolution and multi-binding
//!
//! ```rust
//! use graft_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! trait Handler: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct HandlerA;
//! impl Handler for HandlerA {
//!     fn name(&self) -> &'static str { "a" }
//! }
//!
//! struct HandlerB;
//! impl Handler for HandlerB {
//!     fn name(&self) -> &'static str { "b" }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_trait::<dyn Handler>(Arc::new(HandlerA));
//! services.add_singleton_trait::<dyn Handler>(Arc::new(HandlerB));
//!
//! let container = services.build();
//!
//! // Single resolution returns the active (most recent) binding.
//! assert_eq!(container.get_required_trait::<dyn Handler>().name(), "b");
//!
//! // Collection resolution returns the whole chain, newest first.
//! let all = container.get_all_trait::<dyn Handler>().unwrap();
//! assert_eq!(all.len(), 2);
//! ```
//!
//! ## Startup validation
//!
//! ```rust
//! use graft_di::{ImplDescriptor, ParamSpec, Resolver, ServiceCollection};
//!
//! struct A;
//! struct B;
//!
//! let mut services = ServiceCollection::new();
//! services.add_scoped_impl::<A>(
//!     ImplDescriptor::for_type::<A>()
//!         .ctor(vec![ParamSpec::service::<B>()], |r| {
//!             let _ = r.get::<B>()?;
//!             Ok(A)
//!         })
//!         .build(),
//! );
//! services.add_scoped_impl::<B>(
//!     ImplDescriptor::for_type::<B>()
//!         .ctor(vec![ParamSpec::service::<A>()], |r| {
//!             let _ = r.get::<A>()?;
//!             Ok(B)
//!         })
//!         .build(),
//! );
//!
//! // Fail fast instead of surfacing the cycle on a live request.
//! assert!(services.build_validated().is_err());
//! ```

// Module declarations
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod traits;

// Internal modules
mod cycles;
mod internal;
mod registration;
mod selector;

// Re-export core types
pub use collection::{ServiceCollection, ServiceModule};
pub use descriptors::{
    ConstructorDescriptor, ImplBuilder, ImplDescriptor, ParamSpec, ServiceDescriptor, StrategyKind,
};
pub use error::{DiError, DiResult};
pub use internal::CircularPanic;
pub use key::{all_of, key_of, parameterized_key_of, trait_all_of, trait_key_of, ServiceKey};
pub use lifetime::Lifetime;
pub use provider::{Container, ResolverContext, Scope};
pub use registration::{Binding, FamilyTemplate, ImplChoice};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_singleton_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton(42usize);

        let container = sc.build();
        let a = container.get_required::<usize>();
        let b = container.get_required::<usize>();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_transient_resolution() {
        let mut sc = ServiceCollection::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        sc.add_transient_factory::<String, _>(move |_| {
            let mut c = counter_clone.lock().unwrap();
            *c += 1;
            format!("instance-{}", *c)
        });

        let container = sc.build();
        let a = container.get_required::<String>();
        let b = container.get_required::<String>();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
    }

    #[test]
    fn test_scoped_resolution() {
        let mut sc = ServiceCollection::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        sc.add_scoped_factory::<String, _>(move |_| {
            let mut c = counter_clone.lock().unwrap();
            *c += 1;
            format!("scoped-{}", *c)
        });

        let container = sc.build();

        // Same scope should have same instance
        let scope1 = container.create_scope();
        let s1a = scope1.get_required::<String>();
        let s1b = scope1.get_required::<String>();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        // Different scope should have different instance
        let scope2 = container.create_scope();
        let s2 = scope2.get_required::<String>();
        assert!(!Arc::ptr_eq(&s1a, &s2));
    }

    #[test]
    fn test_trait_resolution() {
        trait TestTrait: Send + Sync {
            fn get_value(&self) -> i32;
        }

        struct TestImpl {
            value: i32,
        }

        impl TestTrait for TestImpl {
            fn get_value(&self) -> i32 {
                self.value
            }
        }

        let mut sc = ServiceCollection::new();
        sc.add_singleton_trait::<dyn TestTrait>(Arc::new(TestImpl { value: 42 }));

        let container = sc.build();
        let service = container.get_required_trait::<dyn TestTrait>();
        assert_eq!(service.get_value(), 42);
    }

    #[test]
    fn test_dynamic_get_service() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton(7u8);

        let container = sc.build();
        assert!(container.get_service(&key_of::<u8>()).unwrap().is_some());
        assert!(container.get_service(&key_of::<u16>()).unwrap().is_none());

        // Unregistered collection requests resolve to the neutral empty
        // sequence rather than an error.
        let empty = container.get_service(&all_of::<u16>()).unwrap().unwrap();
        let items = empty.downcast::<Vec<crate::registration::AnyArc>>().unwrap();
        assert!(items.is_empty());
    }
}
