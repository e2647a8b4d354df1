//! Service provider: the resolving side of the container.
//!
//! This module contains the ServiceProvider type, which looks registrations
//! up, specializes open generic registrations on demand and activates
//! registrations according to their lifetime.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::builder;
use crate::cache::BuildCoordinator;
use crate::descriptors::{self, ServiceDescriptor};
use crate::error::{DiError, DiResult};
use crate::implementation::Dependency;
use crate::internal::ConstructionFrame;
use crate::key::Key;
use crate::observer::Observers;
use crate::options::ContainerOptions;
use crate::registration::{AnyArc, Map, OpenRegistration, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub use context::ResolverContext;

/// Service provider for resolving dependencies from the container.
///
/// A provider is produced by
/// [`ServiceCollection::build`](crate::ServiceCollection::build) and never
/// changes its registrations afterwards. It is cheap to clone (an `Arc`
/// handle) and can be shared across threads; singleton instances are shared by
/// every clone.
///
/// # Resolution
///
/// For a requested key the provider uses, in order: the exact Single
/// registration, the Collection registered under the key (its last member for
/// a single request), or, for a closed key, a registration specialized once
/// from the open generic registration of its open form.
///
/// # Examples
///
/// ```
/// use ferrous_container::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() }).unwrap();
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// }).unwrap();
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registry: Registry,
    // Closed registrations synthesized from open generics, by closed service key.
    // The map lock only guards entry creation; synthesis runs in the entry's cell.
    specialized: RwLock<Map<Key, Arc<OnceCell<Arc<Registration>>>>>,
    coordinator: BuildCoordinator,
    observers: Observers,
    options: ContainerOptions,
}

enum Lookup {
    Single(Arc<Registration>),
    Collection(Arc<[Registration]>),
    Missing,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, observers: Observers, options: ContainerOptions) -> Self {
        debug!(
            registrations = registry.len(),
            observers = observers.has_observers(),
            max_depth = options.max_depth,
            "built service provider"
        );
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                specialized: RwLock::new(Map::default()),
                coordinator: BuildCoordinator::new(),
                observers,
                options,
            }),
        }
    }

    /// Whether `key` can be resolved: an exact Single or Collection, an open
    /// key with an open generic registration, or a closed key whose open form
    /// has one.
    ///
    /// ```
    /// use ferrous_container::{Implementation, Key, Lifetime, OpenImplementation, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register_open_generic(
    ///     Key::open("Repository", 1),
    ///     OpenImplementation::new(Key::open("MemoryRepository", 1), |closed| {
    ///         Ok(Implementation::new(closed.clone()).constructor([], |_| Ok(())))
    ///     }),
    ///     Lifetime::Singleton,
    /// ).unwrap();
    ///
    /// let provider = services.build();
    /// assert!(provider.is_registered(&Key::open("Repository", 1)));
    /// assert!(provider.is_registered(&Key::closed("Repository", [Key::of::<String>()])));
    /// assert!(!provider.is_registered(&Key::of::<String>()));
    /// ```
    pub fn is_registered(&self, key: &Key) -> bool {
        self.inner.registry.is_registered(key)
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Descriptors of every registration, including the closed registrations
    /// synthesized so far from open generics.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut out = ServiceDescriptor::collect(&self.inner.registry);
        out.extend(
            self.inner
                .specialized
                .read()
                .values()
                .filter_map(|cell| cell.get())
                .map(|r| ServiceDescriptor::single(r)),
        );
        descriptors::sort(&mut out);
        out
    }

    /// Number of closed registrations synthesized from open generics.
    pub fn specialization_count(&self) -> usize {
        self.inner.specialized.read().values().filter(|cell| cell.get().is_some()).count()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for descriptor in self.descriptors() {
            let implementations: Vec<String> = descriptor.implementations.iter().map(|k| k.to_string()).collect();
            let _ = writeln!(
                s,
                "  {} [{:?}, {:?}] -> {}",
                descriptor.service,
                descriptor.kind,
                descriptor.lifetime,
                implementations.join(", ")
            );
        }
        s
    }

    /// Whether the builder may pick a constructor taking `dependency`.
    pub(crate) fn can_resolve(&self, dependency: &Dependency) -> bool {
        match dependency {
            // An empty sequence satisfies a collection parameter
            Dependency::Collection(_) => true,
            Dependency::Service(key) => self.inner.registry.can_resolve(key),
        }
    }

    fn lookup(&self, key: &Key) -> DiResult<Lookup> {
        let registry = &self.inner.registry;
        if let Some(registration) = registry.singles.get(key) {
            return Ok(Lookup::Single(registration.clone()));
        }
        if let Some(collection) = registry.collections.get(key) {
            return Ok(Lookup::Collection(collection.members.clone()));
        }
        if let Some(open) = registry.open_for(key) {
            return self.specialize(open, key).map(Lookup::Single);
        }
        Ok(Lookup::Missing)
    }

    /// Specialized registration for a closed key, synthesized at most once.
    ///
    /// Racing first requests for the same key share one cell and one
    /// synthesis; requests for other keys never wait on it. A failed
    /// synthesis leaves the cell empty so the next request retries.
    fn specialize(&self, open: &OpenRegistration, key: &Key) -> DiResult<Arc<Registration>> {
        let cell = self.specialization_cell(key);
        if let Some(registration) = cell.get() {
            return Ok(registration.clone());
        }
        cell.get_or_try_init(|| open.specialize(key).map(Arc::new)).cloned()
    }

    fn specialization_cell(&self, key: &Key) -> Arc<OnceCell<Arc<Registration>>> {
        if let Some(cell) = self.inner.specialized.read().get(key) {
            return cell.clone();
        }
        self.inner
            .specialized
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    pub(crate) fn resolve_in(&self, key: &Key, parent: Option<&ConstructionFrame<'_>>) -> DiResult<AnyArc> {
        trace!(service = %key, depth = parent.map_or(0, |p| p.depth()), "resolve");
        match self.lookup(key)? {
            Lookup::Single(registration) => self.activate(&registration, parent),
            Lookup::Collection(members) => match members.last() {
                Some(last) => self.activate(last, parent),
                None => Err(DiError::NotRegistered(key.clone())),
            },
            Lookup::Missing => Err(DiError::NotRegistered(key.clone())),
        }
    }

    pub(crate) fn resolve_all_in(&self, key: &Key, parent: Option<&ConstructionFrame<'_>>) -> DiResult<Vec<AnyArc>> {
        trace!(service = %key, depth = parent.map_or(0, |p| p.depth()), "resolve all");
        match self.lookup(key)? {
            Lookup::Collection(members) => members.iter().map(|m| self.activate(m, parent)).collect(),
            Lookup::Single(registration) => Ok(vec![self.activate(&registration, parent)?]),
            Lookup::Missing => Ok(Vec::new()),
        }
    }

    fn activate(&self, registration: &Registration, parent: Option<&ConstructionFrame<'_>>) -> DiResult<AnyArc> {
        let observers = &self.inner.observers;
        if !observers.has_observers() {
            return self.activate_unobserved(registration, parent);
        }

        let start = Instant::now();
        observers.resolving(&registration.service);
        let result = self.activate_unobserved(registration, parent);
        match &result {
            Ok(_) => observers.resolved(&registration.service, start.elapsed()),
            Err(error) => observers.failed(&registration.service, error),
        }
        result
    }

    fn activate_unobserved(&self, registration: &Registration, parent: Option<&ConstructionFrame<'_>>) -> DiResult<AnyArc> {
        let max_depth = self.inner.options.max_depth;
        match &registration.slot {
            Some(slot) => {
                // Ready singletons skip the frame entirely
                if let Some(value) = slot.get() {
                    return Ok(value.clone());
                }
                let frame = ConstructionFrame::enter(parent, &registration.service, max_depth)?;
                slot.get_or_build(&registration.service, &self.inner.coordinator, || {
                    builder::build(self, &registration.implementation, &frame)
                })
            }
            None => {
                let frame = ConstructionFrame::enter(parent, &registration.service, max_depth)?;
                builder::build(self, &registration.implementation, &frame)
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_in(key, None)
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.resolve_all_in(key, None)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.inner.registry.len())
            .field("specialized", &self.specialization_count())
            .field("options", &self.inner.options)
            .finish()
    }
}
