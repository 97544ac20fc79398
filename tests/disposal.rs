use async_trait::async_trait;
use graft_di::{AsyncDispose, Dispose, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

struct Tracked {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Dispose for Tracked {
    fn dispose(&self) {
        self.log.lock().unwrap().push(self.name);
    }
}

#[test]
fn test_scope_disposal_reverse_construction_order() {
    struct First(Arc<Tracked>);
    struct Second(Arc<Tracked>);

    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let log1 = log.clone();
    sc.add_scoped_factory::<First, _>(move |r| {
        let inner = Arc::new(Tracked { name: "first", log: log1.clone() });
        r.register_disposer(inner.clone());
        First(inner)
    });
    let log2 = log.clone();
    sc.add_scoped_factory::<Second, _>(move |r| {
        let inner = Arc::new(Tracked { name: "second", log: log2.clone() });
        r.register_disposer(inner.clone());
        Second(inner)
    });

    let container = sc.build();
    let scope = container.create_scope();
    let _ = scope.get_required::<First>();
    let _ = scope.get_required::<Second>();

    scope.dispose();

    // LIFO: last constructed, first disposed.
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
}

#[test]
fn test_disposal_exactly_once_for_repeated_dispose() {
    static DISPOSALS: AtomicU32 = AtomicU32::new(0);

    struct Resource;
    impl Dispose for Resource {
        fn dispose(&self) {
            DISPOSALS.fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Resource, _>(|r| {
        let resource = Arc::new(Resource);
        r.register_disposer(resource.clone());
        Resource
    });

    let container = sc.build();
    let scope = container.create_scope();
    let _ = scope.get_required::<Resource>();

    scope.dispose();
    scope.dispose();
    scope.dispose();

    assert_eq!(DISPOSALS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_disposer_does_not_abort_teardown() {
    struct Fragile;
    impl Dispose for Fragile {
        fn dispose(&self) {
            panic!("teardown failure");
        }
    }

    struct Sturdy(Arc<Tracked>);

    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let log1 = log.clone();
    sc.add_scoped_factory::<Sturdy, _>(move |r| {
        let inner = Arc::new(Tracked { name: "sturdy", log: log1.clone() });
        r.register_disposer(inner.clone());
        Sturdy(inner)
    });
    sc.add_scoped_factory::<Fragile, _>(|r| {
        let fragile = Arc::new(Fragile);
        r.register_disposer(fragile.clone());
        Fragile
    });

    let container = sc.build();
    let scope = container.create_scope();
    let _ = scope.get_required::<Sturdy>();
    let _ = scope.get_required::<Fragile>();

    // Fragile runs first (LIFO) and panics; Sturdy must still dispose.
    scope.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["sturdy"]);
}

#[test]
fn test_container_dispose_runs_singleton_disposers() {
    let log = Arc::new(Mutex::new(Vec::new()));

    struct Cache(Arc<Tracked>);

    let mut sc = ServiceCollection::new();
    let log1 = log.clone();
    sc.add_singleton_factory::<Cache, _>(move |r| {
        let inner = Arc::new(Tracked { name: "cache", log: log1.clone() });
        r.register_disposer(inner.clone());
        Cache(inner)
    });

    let container = sc.build();
    let _ = container.get_required::<Cache>();

    container.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["cache"]);

    // Idempotent: hooks already drained.
    container.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["cache"]);
}

#[test]
fn test_scope_disposal_leaves_singletons_alive() {
    let log = Arc::new(Mutex::new(Vec::new()));

    struct Global(Arc<Tracked>);
    struct Local(Arc<Tracked>);

    let mut sc = ServiceCollection::new();
    let log1 = log.clone();
    sc.add_singleton_factory::<Global, _>(move |r| {
        let inner = Arc::new(Tracked { name: "global", log: log1.clone() });
        r.register_disposer(inner.clone());
        Global(inner)
    });
    let log2 = log.clone();
    sc.add_scoped_factory::<Local, _>(move |r| {
        let inner = Arc::new(Tracked { name: "local", log: log2.clone() });
        r.register_disposer(inner.clone());
        Local(inner)
    });

    let container = sc.build();
    let scope = container.create_scope();

    // The singleton is first resolved from inside the scope; its disposer
    // must attach to the container, not the scope.
    let _ = scope.get_required::<Global>();
    let _ = scope.get_required::<Local>();

    scope.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["local"]);

    container.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["local", "global"]);
}

#[test]
fn test_descriptor_dispose_on_teardown() {
    static DISPOSALS: AtomicU32 = AtomicU32::new(0);

    struct Connection;
    impl Dispose for Connection {
        fn dispose(&self) {
            DISPOSALS.fetch_add(1, Ordering::SeqCst);
        }
    }

    use graft_di::ImplDescriptor;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_impl::<Connection>(
        ImplDescriptor::for_type::<Connection>()
            .ctor(vec![], |_| Ok(Connection))
            .dispose_on_teardown()
            .build(),
    );

    let container = sc.build();
    let scope = container.create_scope();
    let _ = scope.get_required::<Connection>();
    scope.dispose();

    assert_eq!(DISPOSALS.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_async_disposers_run_before_sync() {
    let log = Arc::new(Mutex::new(Vec::new()));

    struct Client {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl AsyncDispose for Client {
        async fn dispose(&self) {
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            self.log.lock().unwrap().push("async-client");
        }
    }

    struct Buffer(Arc<Tracked>);

    let mut sc = ServiceCollection::new();
    let log1 = log.clone();
    sc.add_scoped_factory::<Buffer, _>(move |r| {
        let inner = Arc::new(Tracked { name: "sync-buffer", log: log1.clone() });
        r.register_disposer(inner.clone());
        Buffer(inner)
    });
    let log2 = log.clone();
    sc.add_scoped_factory::<Client, _>(move |r| {
        let client = Arc::new(Client { log: log2.clone() });
        r.register_async_disposer(client.clone());
        Client { log: log2.clone() }
    });

    let container = sc.build();
    let scope = container.create_scope();
    let _ = scope.get_required::<Buffer>();
    let _ = scope.get_required::<Client>();

    scope.dispose_all().await;

    assert_eq!(*log.lock().unwrap(), vec!["async-client", "sync-buffer"]);
}

#[tokio::test]
async fn test_container_dispose_all_async() {
    static DISPOSALS: AtomicU32 = AtomicU32::new(0);

    struct Pool;

    #[async_trait]
    impl AsyncDispose for Pool {
        async fn dispose(&self) {
            DISPOSALS.fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Pool, _>(|r| {
        let pool = Arc::new(Pool);
        r.register_async_disposer(pool.clone());
        Pool
    });

    let container = sc.build();
    let _ = container.get_required::<Pool>();

    container.dispose_all().await;
    container.dispose_all().await;

    assert_eq!(DISPOSALS.load(Ordering::SeqCst), 1);
}
