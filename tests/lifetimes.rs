use parking_lot::Mutex;
use static_provider::{
    services::{self, NestedService, ScopedService, SingletonService, Sound as _, TransientService},
    Container, Inject, Lifetime::*, Registry, ResolveErrorKind,
};
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Barrier,
    },
    thread,
};

#[test]
fn test_services_scenario() {
    let container = Container::new(services::registry().unwrap());

    let (singleton, scoped, nested) = {
        let scope = container.enter();

        let singleton = scope.get::<SingletonService>().unwrap();
        let scoped_1 = scope.get::<ScopedService>().unwrap();
        let scoped_2 = scope.get::<ScopedService>().unwrap();
        let transient_1 = scope.get::<TransientService>().unwrap();
        let transient_2 = scope.get::<TransientService>().unwrap();
        let nested = scope.get::<NestedService>().unwrap();

        assert!(Arc::ptr_eq(&scoped_1, &scoped_2));
        assert_ne!(transient_1.id(), transient_2.id());
        assert!(Arc::ptr_eq(nested.singleton(), &singleton));
        assert!(Arc::ptr_eq(nested.scoped(), &scoped_1));
        assert_ne!(nested.transient().id(), transient_1.id());
        assert_ne!(nested.transient().id(), transient_2.id());
        assert!(nested.make_sound().starts_with("NestedService: Wuff"));

        assert!(!scoped_1.is_released());
        (singleton, scoped_1, nested)
    };

    assert!(scoped.is_released());
    assert!(nested.is_released());
    assert!(nested.transient().is_released());
    assert!(!singleton.is_released());

    let scope = container.enter();
    assert!(Arc::ptr_eq(&scope.get::<SingletonService>().unwrap(), &singleton));
    assert!(!Arc::ptr_eq(&scope.get::<ScopedService>().unwrap(), &scoped));
    assert!(!Arc::ptr_eq(&scope.get::<NestedService>().unwrap(), &nested));
}

#[test]
fn test_release_order() {
    struct Repo;
    struct Service(#[allow(dead_code)] Arc<Repo>);
    struct Request;

    let log = Arc::new(Mutex::new(Vec::new()));
    let container = Container::new(
        Registry::new()
            .provide_with_finalizer(
                || Ok(Repo),
                {
                    let log = log.clone();
                    move |_: Arc<Repo>| log.lock().push("repo")
                },
                Scoped,
            )
            .unwrap()
            .provide_with_finalizer(
                |Inject(repo): Inject<Repo>| Ok(Service(repo)),
                {
                    let log = log.clone();
                    move |_: Arc<Service>| log.lock().push("service")
                },
                Scoped,
            )
            .unwrap()
            .provide_with_finalizer(
                || Ok(Request),
                {
                    let log = log.clone();
                    move |_: Arc<Request>| log.lock().push("request")
                },
                Transient,
            )
            .unwrap(),
    );

    let scope = container.create_scope();
    let _ = scope.get::<Request>().unwrap();
    let _ = scope.get::<Service>().unwrap();
    let _ = scope.get::<Request>().unwrap();
    let _ = scope.get::<Repo>().unwrap();

    scope.close();
    assert_eq!(*log.lock(), ["request", "service", "repo", "request"]);

    scope.close();
    assert_eq!(log.lock().len(), 4);
    assert!(matches!(scope.get::<Repo>(), Err(ResolveErrorKind::ScopeClosed { .. })));
}

#[test]
fn test_release_on_panic() {
    let container = Container::new(services::registry().unwrap());
    let scoped = Arc::new(Mutex::new(None));

    let result = thread::spawn({
        let container = container.clone();
        let scoped = scoped.clone();
        move || {
            let scope = container.enter();
            *scoped.lock() = Some(scope.get::<ScopedService>().unwrap());
            panic!("request failed");
        }
    })
    .join();

    assert!(result.is_err());
    assert!(scoped.lock().as_ref().unwrap().is_released());
}

#[test]
fn test_concurrent_singleton() {
    const THREADS: usize = 8;

    struct Pool;

    let instantiator_call_count = Arc::new(AtomicU8::new(0));
    let container = Container::new(
        Registry::new()
            .provide(
                {
                    let instantiator_call_count = instantiator_call_count.clone();
                    move || {
                        instantiator_call_count.fetch_add(1, Ordering::SeqCst);
                        thread::yield_now();
                        Ok(Pool)
                    }
                },
                Singleton,
            )
            .unwrap(),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let pools = (0..THREADS)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let scope = container.enter();
                scope.get::<Pool>().unwrap()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(instantiator_call_count.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
}

#[test]
fn test_scopes_are_independent() {
    let container = Container::new(services::registry().unwrap());

    let scope_1 = container.create_scope();
    let scope_2 = container.create_scope();
    let scoped_1 = scope_1.get::<ScopedService>().unwrap();
    let scoped_2 = scope_2.get::<ScopedService>().unwrap();

    scope_1.close();
    assert!(scoped_1.is_released());
    assert!(!scoped_2.is_released());
    assert!(Arc::ptr_eq(&scope_2.get::<ScopedService>().unwrap(), &scoped_2));
}
