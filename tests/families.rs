//! Parameterized services resolved through family templates.

use graft_di::{
    parameterized_key_of, Binding, DiError, Lifetime, Resolver, ServiceCollection,
};
use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct Repo<T: Send + Sync + 'static> {
    label: &'static str,
    _marker: PhantomData<T>,
}

struct RepoOf; // family marker for Repo<T>

struct User;
struct Order;

fn repo_binding<T: Send + Sync + 'static>(label: &'static str) -> Binding {
    Binding::factory::<Repo<T>, _>(Lifetime::Singleton, move |_| Repo {
        label,
        _marker: PhantomData,
    })
}

#[test]
fn test_family_template_synthesizes_missing_instantiations() {
    let mut sc = ServiceCollection::new();
    sc.add_family::<RepoOf, _>(|key| {
        if key.type_id() == Some(TypeId::of::<Repo<User>>()) {
            Some(repo_binding::<User>("users"))
        } else if key.type_id() == Some(TypeId::of::<Repo<Order>>()) {
            Some(repo_binding::<Order>("orders"))
        } else {
            None
        }
    });

    let container = sc.build();

    let users = container.get_parameterized::<Repo<User>, RepoOf>().unwrap();
    let orders = container.get_parameterized::<Repo<Order>, RepoOf>().unwrap();
    assert_eq!(users.label, "users");
    assert_eq!(orders.label, "orders");
}

#[test]
fn test_synthesized_binding_is_cached() {
    static SYNTHESIZED: AtomicU32 = AtomicU32::new(0);

    let mut sc = ServiceCollection::new();
    sc.add_family::<RepoOf, _>(|key| {
        if key.type_id() == Some(TypeId::of::<Repo<User>>()) {
            SYNTHESIZED.fetch_add(1, Ordering::SeqCst);
            Some(repo_binding::<User>("users"))
        } else {
            None
        }
    });

    let container = sc.build();
    let first = container.get_parameterized::<Repo<User>, RepoOf>().unwrap();
    let second = container.get_parameterized::<Repo<User>, RepoOf>().unwrap();

    // Template ran once; the synthesized singleton is shared thereafter.
    assert_eq!(SYNTHESIZED.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_exact_binding_wins_over_family() {
    let mut sc = ServiceCollection::new();
    sc.register(
        parameterized_key_of::<Repo<User>, RepoOf>(),
        repo_binding::<User>("explicit"),
    );
    sc.add_family::<RepoOf, _>(|_| {
        panic!("template must not run when an exact binding exists");
    });

    let container = sc.build();
    let repo = container.get_parameterized::<Repo<User>, RepoOf>().unwrap();
    assert_eq!(repo.label, "explicit");
}

#[test]
fn test_uncovered_instantiation_is_not_found() {
    struct Unknown;

    let mut sc = ServiceCollection::new();
    sc.add_family::<RepoOf, _>(|key| {
        if key.type_id() == Some(TypeId::of::<Repo<User>>()) {
            Some(repo_binding::<User>("users"))
        } else {
            None
        }
    });

    let container = sc.build();
    match container.get_parameterized::<Repo<Unknown>, RepoOf>() {
        Err(DiError::NotFound(name)) => assert!(name.contains("Repo")),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_plain_key_reaches_synthesized_binding() {
    let mut sc = ServiceCollection::new();
    sc.add_family::<RepoOf, _>(|key| {
        if key.type_id() == Some(TypeId::of::<Repo<User>>()) {
            Some(repo_binding::<User>("users"))
        } else {
            None
        }
    });

    let container = sc.build();
    // Synthesize through the parameterized request first.
    let via_family = container.get_parameterized::<Repo<User>, RepoOf>().unwrap();
    // The cached binding is installed under the exact identity, so a
    // plain typed request now hits it too.
    let via_type = container.get_required::<Repo<User>>();
    assert!(Arc::ptr_eq(&via_family, &via_type));
}
