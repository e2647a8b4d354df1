//! Service collection: the registration side of the container.
//!
//! This module contains the ServiceCollection type, which records
//! registrations and is frozen into a ServiceProvider by `build`.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::implementation::{Implementation, OpenImplementation};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::options::ContainerOptions;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{AnyArc, Registry};
use crate::validation::{self, ValidationReport};

pub mod module_system;
pub use module_system::*;

/// Registry side of the container.
///
/// Every registration method is fallible and returns `&mut Self` for
/// chaining. A key can be claimed once: a second Single, Collection or
/// OpenGeneric registration for the same key fails with
/// [`DiError::AlreadyRegistered`](crate::DiError::AlreadyRegistered) and
/// leaves the original untouched.
///
/// # Examples
///
/// ```
/// use ferrous_container::{DiResult, ServiceCollection, Resolver};
///
/// struct Config { name: &'static str }
/// struct Banner { text: String }
///
/// # fn main() -> DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton(Config { name: "app" })?
///     .add_transient_factory::<Banner, _>(|r| {
///         Ok(Banner { text: format!("welcome to {}", r.get::<Config>()?.name) })
///     })?;
///
/// let provider = services.build();
/// assert_eq!(provider.get::<Banner>()?.text, "welcome to app");
/// # Ok(())
/// # }
/// ```
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
    options: ContainerOptions,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
            options: ContainerOptions::default(),
        }
    }

    /// Replaces the options the provider will be built with.
    pub fn with_options(&mut self, options: ContainerOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ----- Core registrations -----

    /// Registers `implementation` as the single implementation of `service`.
    ///
    /// # Errors
    ///
    /// `AlreadyRegistered` when the key is already claimed, `NoConstructor`
    /// when the implementation declares no constructor.
    pub fn register(&mut self, service: Key, implementation: Implementation, lifetime: Lifetime) -> DiResult<&mut Self> {
        self.registry.insert_single(service, implementation, lifetime)?;
        Ok(self)
    }

    /// Registers an open generic mapping.
    ///
    /// Any closed key whose open form is `open_service` resolves to the
    /// specialization of `implementation` over the same type arguments.
    ///
    /// ```
    /// use ferrous_container::{Implementation, Key, Lifetime, OpenImplementation, ServiceCollection, Resolver};
    ///
    /// struct Repository { entity: String }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register_open_generic(
    ///     Key::open("IRepository", 1),
    ///     OpenImplementation::new(Key::open("Repository", 1), |closed| {
    ///         let entity = closed.type_arguments()[0].to_string();
    ///         Ok(Implementation::new(closed.clone())
    ///             .constructor([], move |_| Ok(Repository { entity: entity.clone() })))
    ///     }),
    ///     Lifetime::Transient,
    /// ).unwrap();
    ///
    /// let provider = services.build();
    /// let users = provider
    ///     .get_keyed::<Repository>(&Key::closed("IRepository", [Key::of::<u64>()]))
    ///     .unwrap();
    /// assert_eq!(users.entity, "u64");
    /// ```
    ///
    /// # Errors
    ///
    /// `ArityMismatch` unless both keys are open with equal arity,
    /// `AlreadyRegistered` when the open key is already claimed.
    pub fn register_open_generic(
        &mut self,
        open_service: Key,
        implementation: OpenImplementation,
        lifetime: Lifetime,
    ) -> DiResult<&mut Self> {
        self.registry.insert_open(open_service, implementation, lifetime)?;
        Ok(self)
    }

    /// Registers an ordered collection of implementations under one key.
    ///
    /// All members share `lifetime`; singleton members are cached
    /// individually. `resolve_all` yields the members in this order.
    pub fn register_collection<I>(&mut self, service: Key, implementations: I, lifetime: Lifetime) -> DiResult<&mut Self>
    where
        I: IntoIterator<Item = Implementation>,
    {
        self.registry
            .insert_collection(service, implementations.into_iter().collect(), lifetime)?;
        Ok(self)
    }

    /// See [`ServiceProvider::is_registered`].
    pub fn is_registered(&self, key: &Key) -> bool {
        self.registry.is_registered(key)
    }

    // ----- Concrete type conveniences -----

    /// Registers a singleton instance that will be shared across the container.
    ///
    /// The instance is created immediately and wrapped in an `Arc`.
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> DiResult<&mut Self> {
        let instance: AnyArc = Arc::new(value);
        self.register(
            Key::of::<T>(),
            Implementation::shared(Key::of::<T>(), instance),
            Lifetime::Singleton,
        )
    }

    /// Registers a singleton factory, run once on first request.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a transient factory, run on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(Key::of::<T>(), Implementation::factory(Key::of::<T>(), factory), lifetime)
    }

    // ----- Trait object conveniences -----

    /// Registers a singleton trait implementation.
    ///
    /// ```rust
    /// # use ferrous_container::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str) -> String;
    /// }
    ///
    /// struct ConsoleLogger;
    /// impl Logger for ConsoleLogger {
    ///     fn log(&self, message: &str) -> String { format!("LOG: {}", message) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Logger>(Arc::new(ConsoleLogger)).unwrap();
    ///
    /// let provider = services.build();
    /// let logger = provider.get_required_trait::<dyn Logger>();
    /// assert_eq!(logger.log("up"), "LOG: up");
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Trait objects are stored as Arc<Arc<dyn Trait>>
        let instance: AnyArc = Arc::new(value);
        self.register(
            Key::of::<T>(),
            Implementation::shared(Key::of::<T>(), instance),
            Lifetime::Singleton,
        )
    }

    /// Registers a singleton trait factory.
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Singleton, factory)
    }

    /// Registers a transient trait factory.
    ///
    /// ```rust
    /// # use ferrous_container::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct SystemClock;
    /// impl Clock for SystemClock {
    ///     fn now(&self) -> u64 { 1 }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_trait_factory::<dyn Clock, _>(|_| Ok(Arc::new(SystemClock))).unwrap();
    ///
    /// let provider = services.build();
    /// let a = provider.get_required_trait::<dyn Clock>();
    /// let b = provider.get_required_trait::<dyn Clock>();
    /// assert!(!Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Transient, factory)
    }

    fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> DiResult<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        self.register(Key::of::<Trait>(), Implementation::factory(Key::of::<Trait>(), factory), lifetime)
    }

    // ----- Diagnostics -----

    /// Adds an observer notified around every activation.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Descriptors of every registration made so far.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        ServiceDescriptor::collect(&self.registry)
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks declared constructor dependencies without constructing anything.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.registry, self.options.max_depth)
    }

    // ----- Build -----

    /// Freezes the registrations into a [`ServiceProvider`].
    ///
    /// Consuming the collection guarantees that no registration happens
    /// after resolution starts.
    ///
    /// ```
    /// use ferrous_container::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton(42usize).unwrap();
    /// collection.add_transient_factory::<String, _>(|_| Ok("Hello".to_string())).unwrap();
    ///
    /// let provider = collection.build();
    /// assert_eq!(*provider.get_required::<usize>(), 42);
    /// assert_eq!(&*provider.get_required::<String>(), "Hello");
    /// ```
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.registry, self.observers, self.options)
    }

    /// Validates, then builds.
    ///
    /// Fails with [`DiError::Validation`](crate::DiError::Validation) when the
    /// report contains errors; warnings do not prevent the build.
    pub fn try_build(self) -> DiResult<ServiceProvider> {
        self.validate().into_result()?;
        Ok(self.build())
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registrations", &self.registry.len())
            .field("options", &self.options)
            .finish()
    }
}
