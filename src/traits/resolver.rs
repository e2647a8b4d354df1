//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::DiResult;
use crate::implementation::{downcast, downcast_trait};
use crate::key::Key;
use crate::registration::AnyArc;

/// Object-safe resolution over type-erased instances.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider) for root
/// requests and by [`ResolverContext`](crate::ResolverContext) for requests
/// made while constructing another service.
pub trait ResolverCore: Send + Sync {
    /// Resolves one instance of `key`.
    ///
    /// A Single registration (exact or specialized from an open generic) is
    /// activated per its lifetime. A Collection key yields its last member;
    /// an empty Collection fails with `NotRegistered` even though the key
    /// reports as registered.
    fn resolve(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves every instance registered under `key`, in registration order.
    ///
    /// Unknown keys yield an empty sequence.
    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>>;
}

/// Typed resolution helpers.
///
/// Concrete services are resolved with [`get`](Resolver::get), trait-object
/// services with [`get_trait`](Resolver::get_trait). The `_keyed` variants
/// take an explicit key, which is how open generic specializations are
/// requested.
///
/// # Examples
///
/// ```
/// use ferrous_container::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_trait::<dyn Greeter>(Arc::new(English)).unwrap();
///
/// let provider = services.build();
/// assert_eq!(provider.get_required_trait::<dyn Greeter>().greet(), "hello");
/// ```
pub trait Resolver: ResolverCore {
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_keyed::<T>(&Key::of::<T>())
    }

    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_keyed_trait::<T>(&Key::of::<T>())
    }

    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.get_all_keyed::<T>(&Key::of::<T>())
    }

    fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.get_all_keyed_trait::<T>(&Key::of::<T>())
    }

    /// Resolves `key` and downcasts the instance to `T`.
    fn get_keyed<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve(key)?)
    }

    /// Resolves `key` and unwraps the stored `Arc<T>` trait object.
    fn get_keyed_trait<T: ?Sized + Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve(key)?)
    }

    fn get_all_keyed<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(key)?.into_iter().map(downcast::<T>).collect()
    }

    fn get_all_keyed_trait<T: ?Sized + Send + Sync + 'static>(&self, key: &Key) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(key)?.into_iter().map(downcast_trait::<T>).collect()
    }

    /// Like [`get`](Resolver::get) but panics on failure. Meant for wiring
    /// code where a missing registration is a programming error.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    fn get_required_keyed<T: Send + Sync + 'static>(&self, key: &Key) -> Arc<T> {
        self.get_keyed::<T>(key)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", key, e))
    }

    fn get_required_keyed_trait<T: ?Sized + Send + Sync + 'static>(&self, key: &Key) -> Arc<T> {
        self.get_keyed_trait::<T>(key)
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", key, e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
