//! Service module system for modular registration.
//!
//! Modules group related registrations so that an application can be wired
//! from reusable pieces.

use crate::collection::ServiceCollection;
use crate::error::DiResult;

/// A module that registers services with a ServiceCollection.
///
/// # Example
///
/// ```rust
/// use ferrous_container::{
///     DiResult, Dependency, Implementation, Key, Lifetime, Resolver, ServiceCollection,
///     ServiceCollectionModuleExt, ServiceModule,
/// };
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserService { config: Arc<UserConfig> }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(UserConfig::default())?;
///         services.register(
///             Key::of::<UserService>(),
///             Implementation::of::<UserService>()
///                 .constructor([Dependency::of::<UserConfig>()], |args| {
///                     Ok(UserService { config: args.get::<UserConfig>(0)? })
///                 }),
///             Lifetime::Transient,
///         )?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_module_mut(UserModule)?;
/// let provider = services.build();
/// provider.get::<UserService>()?;
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the ServiceCollection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Extension trait for consuming module registration.
pub trait ServiceCollectionExt {
    /// Adds a module, passing the collection through.
    ///
    /// ```rust
    /// use ferrous_container::{DiResult, ServiceCollection, ServiceCollectionExt, ServiceModule};
    ///
    /// struct DatabaseModule;
    /// impl ServiceModule for DatabaseModule {
    ///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
    ///         services.add_singleton(5432u16)?;
    ///         Ok(())
    ///     }
    /// }
    ///
    /// struct UserModule;
    /// impl ServiceModule for UserModule {
    ///     fn register_services(self, _: &mut ServiceCollection) -> DiResult<()> { Ok(()) }
    /// }
    ///
    /// # fn main() -> DiResult<()> {
    /// let provider = ServiceCollection::new()
    ///     .add_module(DatabaseModule)?
    ///     .add_module(UserModule)?
    ///     .build();
    /// # Ok(())
    /// # }
    /// ```
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        module.register_services(&mut self)?;
        Ok(self)
    }
}

/// Extension trait for in-place module registration, matching the
/// `&mut Self` chaining of the other registration methods.
pub trait ServiceCollectionModuleExt {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionModuleExt for ServiceCollection {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
