//! Concurrent access: singleton exactly-once and scope consistency.

use graft_di::{Resolver, ServiceCollection};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_singleton_constructed_once_under_contention() {
    static CONSTRUCTIONS: AtomicU32 = AtomicU32::new(0);

    struct Expensive {
        payload: Vec<u64>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Expensive, _>(|_| {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        // Widen the race window a little.
        thread::yield_now();
        Expensive { payload: (0..128).collect() }
    });

    let container = sc.build();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            thread::spawn(move || container.get_required::<Expensive>())
        })
        .collect();

    let instances: Vec<Arc<Expensive>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
        assert_eq!(instance.payload.len(), 128);
    }
}

#[test]
fn test_scoped_instance_shared_across_threads_in_one_scope() {
    static CONSTRUCTIONS: AtomicU32 = AtomicU32::new(0);

    struct Session;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Session, _>(|_| {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        thread::yield_now();
        Session
    });

    let container = sc.build();
    let scope = Arc::new(container.create_scope());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scope = scope.clone();
            thread::spawn(move || scope.get_required::<Session>())
        })
        .collect();

    let instances: Vec<Arc<Session>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[test]
fn test_distinct_scopes_do_not_contend() {
    struct Ticket(u64);

    let mut sc = ServiceCollection::new();
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();
    sc.add_scoped_factory::<Ticket, _>(move |_| {
        Ticket(counter_clone.fetch_add(1, Ordering::SeqCst) as u64)
    });

    let container = sc.build();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            thread::spawn(move || {
                let scope = container.create_scope();
                let a = scope.get_required::<Ticket>();
                let b = scope.get_required::<Ticket>();
                assert!(Arc::ptr_eq(&a, &b));
                a.0
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8); // One construction per scope
    assert_eq!(counter.load(Ordering::SeqCst), 8);
}

#[test]
fn test_concurrent_mixed_resolution() {
    struct Config;
    struct Service {
        _config: Arc<Config>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Config, _>(|_| Config);
    sc.add_transient_factory::<Service, _>(|r| Service {
        _config: r.get_required::<Config>(),
    });

    let container = sc.build();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let container = container.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        let _ = container.get_required::<Service>();
                    } else {
                        let scope = container.create_scope();
                        let _ = scope.get_required::<Service>();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
