//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: one instance for the container
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// }).unwrap();
///
/// // Transient: new instance every time
/// services.add_transient_factory::<RequestModel, _>(|_| Ok(RequestModel { id: 12345 })).unwrap();
///
/// let provider = services.build();
///
/// let db1 = provider.get_required::<Database>();
/// let db2 = provider.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let model1 = provider.get_required::<RequestModel>();
/// let model2 = provider.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// One instance per service key, built on first request and cached for
    /// the life of the provider
    ///
    /// Concurrent first requests build exactly once; every caller observes
    /// the same instance.
    Singleton,
    /// New instance per resolution, never cached
    Transient,
}
