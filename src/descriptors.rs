//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Registration, RegistrationKind, Registry};

/// Service descriptor for introspection and diagnostics
///
/// Describes one registration without exposing its constructors. Use it to
/// inspect what a container will be able to resolve, for example in a health
/// check at startup.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Key, Lifetime, RegistrationKind, ServiceCollection};
///
/// struct Database { url: String }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() }).unwrap();
///
/// let descriptors = services.descriptors();
/// let db = descriptors.iter()
///     .find(|d| d.service == Key::of::<Database>())
///     .unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert_eq!(db.kind, RegistrationKind::Single);
/// assert!(db.type_name().contains("Database"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The service key the registration answers to
    pub service: Key,
    /// Implementation keys: one for Single and OpenGeneric, the ordered
    /// members for Collection
    pub implementations: Vec<Key>,
    pub lifetime: Lifetime,
    pub kind: RegistrationKind,
}

impl ServiceDescriptor {
    pub(crate) fn single(registration: &Registration) -> Self {
        Self {
            service: registration.service.clone(),
            implementations: vec![registration.implementation.key().clone()],
            lifetime: registration.lifetime,
            kind: RegistrationKind::Single,
        }
    }

    /// Human-readable service name.
    pub fn type_name(&self) -> &'static str {
        self.service.name()
    }

    /// Whether the descriptor stands for an open generic registration.
    pub fn is_open_generic(&self) -> bool {
        self.kind == RegistrationKind::OpenGeneric
    }

    /// Descriptors for every registration in `registry`, sorted by service
    /// key display for stable output.
    pub(crate) fn collect(registry: &Registry) -> Vec<ServiceDescriptor> {
        let mut out: Vec<ServiceDescriptor> = Vec::with_capacity(registry.len());
        out.extend(registry.singles.values().map(|r| Self::single(r)));
        out.extend(registry.collections.iter().map(|(service, collection)| Self {
            service: service.clone(),
            implementations: collection.members.iter().map(|m| m.implementation.key().clone()).collect(),
            lifetime: collection.lifetime,
            kind: RegistrationKind::Collection,
        }));
        out.extend(registry.open.values().map(|open| Self {
            service: open.service.clone(),
            implementations: vec![open.implementation.key().clone()],
            lifetime: open.lifetime,
            kind: RegistrationKind::OpenGeneric,
        }));
        sort(&mut out);
        out
    }
}

pub(crate) fn sort(descriptors: &mut [ServiceDescriptor]) {
    descriptors.sort_by_cached_key(|d| d.service.to_string());
}
