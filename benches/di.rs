use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graft_di::{Resolver, ServiceCollection};
use std::sync::Arc;

fn bench_singleton_hit(c: &mut Criterion) {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42u64);
    let container = sc.build();

    // Prime the singleton
    let _ = container.get::<u64>().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = container.get::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_transient_factory(c: &mut Criterion) {
    struct Service {
        data: [u8; 64],
    }

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Service, _>(|_| Service { data: [0; 64] });
    let container = sc.build();

    c.bench_function("transient_factory", |b| {
        b.iter(|| {
            let v = container.get::<Service>().unwrap();
            black_box(v.data[0]);
        })
    });
}

fn bench_scoped_hit(c: &mut Criterion) {
    struct Session {
        id: u64,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Session, _>(|_| Session { id: 7 });
    let container = sc.build();
    let scope = container.create_scope();

    // Prime the scoped cache
    let _ = scope.get::<Session>().unwrap();

    c.bench_function("scoped_hit", |b| {
        b.iter(|| {
            let v = scope.get::<Session>().unwrap();
            black_box(v.id);
        })
    });
}

fn bench_dependency_chain(c: &mut Criterion) {
    struct Config {
        url: String,
    }
    struct Database {
        config: Arc<Config>,
    }
    struct Repository {
        db: Arc<Database>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { url: "postgres://localhost".to_string() });
    sc.add_singleton_factory::<Database, _>(|r| Database {
        config: r.get_required::<Config>(),
    });
    sc.add_transient_factory::<Repository, _>(|r| Repository {
        db: r.get_required::<Database>(),
    });
    let container = sc.build();

    c.bench_function("transient_with_singleton_chain", |b| {
        b.iter(|| {
            let repo = container.get::<Repository>().unwrap();
            black_box(repo.db.config.url.len());
        })
    });
}

fn bench_scope_create_dispose(c: &mut Criterion) {
    struct Session;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Session, _>(|_| Session);
    let container = sc.build();

    c.bench_function("scope_create_resolve_dispose", |b| {
        b.iter(|| {
            let scope = container.create_scope();
            let v = scope.get::<Session>().unwrap();
            black_box(&v);
            scope.dispose();
        })
    });
}

fn bench_collection_resolution(c: &mut Criterion) {
    trait Plugin: Send + Sync {}
    struct P1;
    impl Plugin for P1 {}
    struct P2;
    impl Plugin for P2 {}
    struct P3;
    impl Plugin for P3 {}

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Plugin>(Arc::new(P1));
    sc.add_singleton_trait::<dyn Plugin>(Arc::new(P2));
    sc.add_singleton_trait::<dyn Plugin>(Arc::new(P3));
    let container = sc.build();

    c.bench_function("collection_of_three", |b| {
        b.iter(|| {
            let all = container.get_all_trait::<dyn Plugin>().unwrap();
            black_box(all.len());
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_transient_factory,
    bench_scoped_hit,
    bench_dependency_chain,
    bench_scope_create_dispose,
    bench_collection_resolution
);
criterion_main!(benches);
