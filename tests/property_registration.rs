/// Property-based tests for service registration
///
/// These tests use proptest to generate random inputs and verify invariants
/// that should hold for all registrations.

use ferrous_container::{
    DiError, Implementation, Key, Lifetime, OpenImplementation, Resolver, ServiceCollection,
    ServiceCollectionModuleExt, ServiceModule, DiResult,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Test data structures
#[derive(Debug, Clone)]
struct TestService {
    id: u32,
    name: String,
}

/// Peano-style key for a small integer: `Wrap<Wrap<u8>>` is 2.
fn numbered(n: usize) -> Key {
    (0..n).fold(Key::of::<u8>(), |inner, _| Key::closed("Wrap", [inner]))
}

// Property: the first registration of a key wins, later ones are rejected
proptest! {
    #[test]
    fn first_registration_wins(ids in prop::collection::vec(0u32..1000, 1..10)) {
        let mut services = ServiceCollection::new();

        let mut rejected = 0;
        for id in &ids {
            let result = services.add_singleton(TestService {
                id: *id,
                name: format!("service_{}", id),
            });
            if let Err(DiError::AlreadyRegistered(_)) = result {
                rejected += 1;
            }
        }
        prop_assert_eq!(rejected, ids.len() - 1);
        prop_assert_eq!(services.len(), 1);

        let provider = services.build();
        let resolved = provider.get_required::<TestService>();
        prop_assert_eq!(resolved.id, ids[0]);
        prop_assert_eq!(&resolved.name, &format!("service_{}", ids[0]));
    }
}

// Property: collections resolve in registration order, whatever their size
proptest! {
    #[test]
    fn collection_preserves_registration_order(
        values in prop::collection::vec(any::<i64>(), 0..20),
        singleton in any::<bool>(),
    ) {
        let lifetime = if singleton { Lifetime::Singleton } else { Lifetime::Transient };
        let mut services = ServiceCollection::new();
        services.register_collection(
            Key::of::<i64>(),
            values.iter().map(|v| {
                let v = *v;
                Implementation::of::<i64>().constructor([], move |_| Ok(v))
            }),
            lifetime,
        ).unwrap();

        let provider = services.build();
        let resolved: Vec<i64> = provider.get_all::<i64>().unwrap().iter().map(|v| **v).collect();
        prop_assert_eq!(&resolved, &values);

        match values.last() {
            Some(last) => prop_assert_eq!(*provider.get_required::<i64>(), *last),
            None => prop_assert!(provider.get::<i64>().is_err()),
        }
    }
}

// Property: each distinct closed key is specialized exactly once
proptest! {
    #[test]
    fn specialization_count_matches_distinct_closed_keys(
        requests in prop::collection::vec(0usize..6, 1..30),
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut services = ServiceCollection::new();
        services.register_open_generic(
            Key::open("Box", 1),
            OpenImplementation::new(Key::open("BoxImpl", 1), move |closed| {
                counter.fetch_add(1, Ordering::SeqCst);
                let label = closed.to_string();
                Ok(Implementation::new(closed.clone()).constructor([], move |_| Ok(label.clone())))
            }),
            Lifetime::Singleton,
        ).unwrap();

        let provider = services.build();
        for n in &requests {
            let label = provider.get_required_keyed::<String>(&Key::closed("Box", [numbered(*n)]));
            prop_assert!(label.starts_with("BoxImpl<"));
        }

        let mut distinct = requests.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(provider.specialization_count(), distinct.len());
        prop_assert_eq!(calls.load(Ordering::SeqCst), distinct.len());
    }
}

// Property: is_registered reflects exactly what modules registered
proptest! {
    #[test]
    fn module_registrations_are_visible(flags in prop::collection::vec(any::<bool>(), 1..8)) {
        struct NumberedModule(usize);

        impl ServiceModule for NumberedModule {
            fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
                let n = self.0;
                services.register(
                    numbered(n),
                    Implementation::new(numbered(n)).constructor([], move |_| Ok(n)),
                    Lifetime::Transient,
                )?;
                Ok(())
            }
        }

        let mut services = ServiceCollection::new();
        for (n, register) in flags.iter().enumerate() {
            if *register {
                services.add_module_mut(NumberedModule(n)).unwrap();
            }
        }

        let provider = services.build();
        for (n, register) in flags.iter().enumerate() {
            prop_assert_eq!(provider.is_registered(&numbered(n)), *register);
            if *register {
                prop_assert_eq!(*provider.get_required_keyed::<usize>(&numbered(n)), n);
            }
        }
    }
}

// Property: a singleton factory runs once however often it is resolved
proptest! {
    #[test]
    fn singleton_factory_runs_once(seed in 0u32..1000, resolutions in 1usize..20) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_singleton_factory::<TestService, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(TestService {
                id: seed,
                name: format!("factory_{}", seed),
            })
        }).unwrap();

        let provider = services.build();
        let first = provider.get_required::<TestService>();
        for _ in 0..resolutions {
            prop_assert!(Arc::ptr_eq(&first, &provider.get_required::<TestService>()));
        }
        prop_assert_eq!(first.id, seed);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
