use ferrous_container::{
    DiError, Dependency, Implementation, Key, Lifetime, RegistrationKind, Resolver, ServiceCollection,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait IService: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Service1;
struct Service2;
struct Service3;

impl IService for Service1 {
    fn name(&self) -> &'static str {
        "Service1"
    }
}

impl IService for Service2 {
    fn name(&self) -> &'static str {
        "Service2"
    }
}

impl IService for Service3 {
    fn name(&self) -> &'static str {
        "Service3"
    }
}

fn service_implementations() -> Vec<Implementation> {
    vec![
        Implementation::of::<Service1>().constructor([], |_| Ok(Arc::new(Service1) as Arc<dyn IService>)),
        Implementation::of::<Service2>().constructor([], |_| Ok(Arc::new(Service2) as Arc<dyn IService>)),
        Implementation::of::<Service3>().constructor([], |_| Ok(Arc::new(Service3) as Arc<dyn IService>)),
    ]
}

fn names(services: &[Arc<dyn IService>]) -> Vec<&'static str> {
    services.iter().map(|s| s.name()).collect()
}

#[test]
fn test_resolve_all_in_registration_order() {
    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), service_implementations(), Lifetime::Singleton)
        .unwrap();

    let sp = sc.build();
    let services = sp.get_all_trait::<dyn IService>().unwrap();
    assert_eq!(names(&services), ["Service1", "Service2", "Service3"]);

    // Singleton members are cached individually
    let again = sp.get_all_trait::<dyn IService>().unwrap();
    for (a, b) in services.iter().zip(again.iter()) {
        assert!(Arc::ptr_eq(a, b));
    }
}

#[test]
fn test_transient_collection_builds_new_members() {
    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), service_implementations(), Lifetime::Transient)
        .unwrap();

    let sp = sc.build();
    let first = sp.get_all_trait::<dyn IService>().unwrap();
    let second = sp.get_all_trait::<dyn IService>().unwrap();
    assert_eq!(names(&first), names(&second));
    assert!(!Arc::ptr_eq(&first[0], &second[0]));
}

#[test]
fn test_single_resolve_returns_last_member() {
    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), service_implementations(), Lifetime::Singleton)
        .unwrap();

    let sp = sc.build();
    let single = sp.get_required_trait::<dyn IService>();
    assert_eq!(single.name(), "Service3");

    let all = sp.get_all_trait::<dyn IService>().unwrap();
    assert!(Arc::ptr_eq(&single, &all[2]));
}

#[test]
fn test_collection_dependency_is_injected() {
    struct Dispatcher {
        handlers: Vec<Arc<dyn IService>>,
    }

    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), service_implementations(), Lifetime::Singleton)
        .unwrap();
    sc.register(
        Key::of::<Dispatcher>(),
        Implementation::of::<Dispatcher>().constructor([Dependency::collection_of::<dyn IService>()], |args| {
            Ok(Dispatcher {
                handlers: args.get_all_trait::<dyn IService>(0)?,
            })
        }),
        Lifetime::Transient,
    )
    .unwrap();

    let sp = sc.build();
    let dispatcher = sp.get_required::<Dispatcher>();
    assert_eq!(names(&dispatcher.handlers), ["Service1", "Service2", "Service3"]);

    // Singleton members: the dependent sees the very instances resolved directly
    let direct = sp.get_all_trait::<dyn IService>().unwrap();
    assert_eq!(dispatcher.handlers.len(), direct.len());
    for (injected, resolved) in dispatcher.handlers.iter().zip(&direct) {
        assert!(Arc::ptr_eq(injected, resolved));
    }
}

#[test]
fn test_collection_dependency_on_unknown_key_is_empty() {
    struct Listener;
    struct Bus {
        listeners: Vec<Arc<Listener>>,
    }

    let mut sc = ServiceCollection::new();
    sc.register(
        Key::of::<Bus>(),
        Implementation::of::<Bus>().constructor([Dependency::collection_of::<Listener>()], |args| {
            Ok(Bus {
                listeners: args.get_all::<Listener>(0)?,
            })
        }),
        Lifetime::Transient,
    )
    .unwrap();

    let sp = sc.build();
    assert!(sp.get_required::<Bus>().listeners.is_empty());
}

#[test]
fn test_resolve_all_on_single_registration() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(7u64).unwrap();

    let sp = sc.build();
    let all = sp.get_all::<u64>().unwrap();
    assert_eq!(all.len(), 1);
    assert!(Arc::ptr_eq(&all[0], &sp.get_required::<u64>()));
}

#[test]
fn test_empty_collection() {
    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), Vec::new(), Lifetime::Singleton)
        .unwrap();
    assert!(sc.is_registered(&Key::of::<dyn IService>()));

    let sp = sc.build();
    assert!(sp.is_registered(&Key::of::<dyn IService>()));
    assert!(sp.get_all_trait::<dyn IService>().unwrap().is_empty());
    assert!(matches!(
        sp.get_trait::<dyn IService>(),
        Err(DiError::NotRegistered(_))
    ));
}

#[test]
fn test_collection_member_with_dependencies() {
    struct Prefix(&'static str);

    struct Prefixed {
        prefix: Arc<Prefix>,
    }

    impl IService for Prefixed {
        fn name(&self) -> &'static str {
            self.prefix.0
        }
    }

    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Prefix("prefixed")).unwrap();
    sc.register_collection(
        Key::of::<dyn IService>(),
        [
            Implementation::of::<Service1>().constructor([], |_| Ok(Arc::new(Service1) as Arc<dyn IService>)),
            Implementation::of::<Prefixed>().constructor([Dependency::of::<Prefix>()], move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Prefixed {
                    prefix: args.get::<Prefix>(0)?,
                }) as Arc<dyn IService>)
            }),
        ],
        Lifetime::Singleton,
    )
    .unwrap();

    let sp = sc.build();
    assert_eq!(names(&sp.get_all_trait::<dyn IService>().unwrap()), ["Service1", "prefixed"]);
    sp.get_all_trait::<dyn IService>().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_collection_descriptor_lists_members() {
    let mut sc = ServiceCollection::new();
    sc.register_collection(Key::of::<dyn IService>(), service_implementations(), Lifetime::Singleton)
        .unwrap();

    let descriptors = sc.descriptors();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].kind, RegistrationKind::Collection);
    assert_eq!(
        descriptors[0].implementations,
        vec![Key::of::<Service1>(), Key::of::<Service2>(), Key::of::<Service3>()]
    );
}
