//! Resolver context passed to constructors and factories.

use crate::error::{DiError, DiResult};
use crate::internal::ConstructionFrame;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::ServiceProvider;

/// Context passed to factory functions for resolving dependencies.
///
/// The context carries the chain of keys currently under construction, so
/// dependencies resolved through it are cycle-checked and errors name the
/// full path from the root request. No root provider is exposed; every
/// nested request stays on the current chain.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// }).unwrap();
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// }).unwrap();
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    provider: &'a ServiceProvider,
    frame: &'a ConstructionFrame<'a>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(provider: &'a ServiceProvider, frame: &'a ConstructionFrame<'a>) -> Self {
        Self { provider, frame }
    }

    /// Key of the service being constructed.
    pub fn service(&self) -> &Key {
        self.frame.key()
    }

    /// Keys under construction, from the root request to the current service.
    pub fn chain(&self) -> Vec<Key> {
        self.frame.chain()
    }

    // A missing dependency is wrapped once, by the innermost construction;
    // outer frames see UnresolvableDependency and pass it through.
    fn wrap(&self, error: DiError) -> DiError {
        match error {
            DiError::NotRegistered(missing) => DiError::UnresolvableDependency {
                chain: self.frame.chain(),
                dependency: missing.clone(),
                source: Box::new(DiError::NotRegistered(missing)),
            },
            other => other,
        }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        self.provider
            .resolve_in(key, Some(self.frame))
            .map_err(|e| self.wrap(e))
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.provider
            .resolve_all_in(key, Some(self.frame))
            .map_err(|e| self.wrap(e))
    }
}
