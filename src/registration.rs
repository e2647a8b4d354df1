//! Registration table.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::cache::SingletonSlot;
use crate::error::{DiError, DiResult};
use crate::implementation::{Implementation, OpenImplementation};
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Type-erased shared instance, as stored and returned by the container.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// How a service key was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    /// One implementation for one (closed) service key
    Single,
    /// Ordered implementations sharing one service key
    Collection,
    /// Open service form, specialized per closed key on first resolution
    OpenGeneric,
}

/// A constructible entry: service key, implementation and lifetime.
///
/// Singleton entries own their cache slot, so the instance lives exactly as
/// long as the registration.
pub(crate) struct Registration {
    pub(crate) service: Key,
    pub(crate) implementation: Implementation,
    pub(crate) lifetime: Lifetime,
    pub(crate) slot: Option<SingletonSlot>,
}

impl Registration {
    pub(crate) fn new(service: Key, implementation: Implementation, lifetime: Lifetime) -> Self {
        let slot = match lifetime {
            Lifetime::Singleton => Some(SingletonSlot::new()),
            Lifetime::Transient => None,
        };
        Self {
            service,
            implementation,
            lifetime,
            slot,
        }
    }
}

/// Open generic entry, specialized lazily by the provider.
pub(crate) struct OpenRegistration {
    pub(crate) service: Key,
    pub(crate) implementation: OpenImplementation,
    pub(crate) lifetime: Lifetime,
}

impl OpenRegistration {
    /// Synthesizes the Single registration for a closed service key.
    pub(crate) fn specialize(&self, closed: &Key) -> DiResult<Registration> {
        let implementation = self.implementation.specialize(closed.type_arguments())?;
        debug!(
            service = %closed,
            implementation = %implementation.key(),
            lifetime = ?self.lifetime,
            "specialized open generic registration"
        );
        Ok(Registration::new(closed.clone(), implementation, self.lifetime))
    }
}

/// Ordered members sharing one service key and lifetime.
pub(crate) struct Collection {
    pub(crate) lifetime: Lifetime,
    pub(crate) members: Arc<[Registration]>,
}

/// Service registry holding all registrations.
///
/// Insertion order is kept per collection; the maps themselves are unordered.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) singles: Map<Key, Arc<Registration>>,
    pub(crate) collections: Map<Key, Collection>,
    pub(crate) open: Map<Key, OpenRegistration>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn claimed(&self, key: &Key) -> bool {
        self.singles.contains_key(key) || self.collections.contains_key(key) || self.open.contains_key(key)
    }

    pub(crate) fn insert_single(
        &mut self,
        service: Key,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> DiResult<()> {
        if self.claimed(&service) {
            return Err(DiError::AlreadyRegistered(service));
        }
        if implementation.constructors().is_empty() {
            return Err(DiError::NoConstructor(implementation.key().clone()));
        }
        debug!(
            service = %service,
            implementation = %implementation.key(),
            lifetime = ?lifetime,
            "registered service"
        );
        let registration = Registration::new(service.clone(), implementation, lifetime);
        self.singles.insert(service, Arc::new(registration));
        Ok(())
    }

    pub(crate) fn insert_collection(
        &mut self,
        service: Key,
        implementations: Vec<Implementation>,
        lifetime: Lifetime,
    ) -> DiResult<()> {
        if self.claimed(&service) {
            return Err(DiError::AlreadyRegistered(service));
        }
        if let Some(empty) = implementations.iter().find(|i| i.constructors().is_empty()) {
            return Err(DiError::NoConstructor(empty.key().clone()));
        }
        debug!(
            service = %service,
            members = implementations.len(),
            lifetime = ?lifetime,
            "registered service collection"
        );
        let members: Vec<Registration> = implementations
            .into_iter()
            .map(|implementation| Registration::new(service.clone(), implementation, lifetime))
            .collect();
        self.collections.insert(
            service,
            Collection {
                lifetime,
                members: members.into(),
            },
        );
        Ok(())
    }

    pub(crate) fn insert_open(
        &mut self,
        service: Key,
        implementation: OpenImplementation,
        lifetime: Lifetime,
    ) -> DiResult<()> {
        let implementation_key = implementation.key();
        if !service.is_open() || !implementation_key.is_open() || service.arity() != implementation_key.arity() {
            return Err(DiError::ArityMismatch {
                service_arity: service.arity(),
                implementation: implementation_key.clone(),
                implementation_arity: implementation_key.arity(),
                service,
            });
        }
        if self.claimed(&service) {
            return Err(DiError::AlreadyRegistered(service));
        }
        debug!(
            service = %service,
            implementation = %implementation_key,
            lifetime = ?lifetime,
            "registered open generic service"
        );
        self.open.insert(
            service.clone(),
            OpenRegistration {
                service,
                implementation,
                lifetime,
            },
        );
        Ok(())
    }

    /// The open registration a closed key can be specialized from.
    pub(crate) fn open_for(&self, key: &Key) -> Option<&OpenRegistration> {
        key.open_form().and_then(|open| self.open.get(&open))
    }

    pub(crate) fn is_registered(&self, key: &Key) -> bool {
        self.singles.contains_key(key)
            || self.collections.contains_key(key)
            || (key.is_open() && self.open.contains_key(key))
            || self.open_for(key).is_some()
    }

    /// Whether a single-instance request for `key` can find a registration.
    ///
    /// Unlike [`is_registered`](Self::is_registered) this excludes open keys
    /// and empty collections, which cannot produce an instance.
    pub(crate) fn can_resolve(&self, key: &Key) -> bool {
        self.singles.contains_key(key)
            || self.collections.get(key).is_some_and(|c| !c.members.is_empty())
            || self.open_for(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.singles.len() + self.collections.len() + self.open.len()
    }
}
