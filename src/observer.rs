//! Diagnostic observers for resolution traceability.
//!
//! Observers are notified around every activation of a registration: a
//! singleton cache hit, a singleton or transient construction, and each member
//! of a collection. Resolutions that fail before a registration is found
//! (unknown keys) are reported through the returned error only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::DiError;
use crate::key::Key;

/// Hooks for observing resolution events.
///
/// Observer calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_container::{DiError, DiObserver, Key, ServiceCollection, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder { events: Mutex<Vec<String>> }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.events.lock().unwrap().push(format!("resolving {}", key));
///     }
///
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.events.lock().unwrap().push(format!("resolved {}", key));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut services = ServiceCollection::new();
/// services.add_observer(recorder.clone());
/// services.add_singleton(5u8).unwrap();
///
/// let provider = services.build();
/// provider.get_required::<u8>();
/// assert_eq!(recorder.events.lock().unwrap().len(), 2);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a registration is activated.
    fn resolving(&self, key: &Key);

    /// Called after a registration produced an instance.
    ///
    /// * `duration` - Time elapsed since the matching `resolving` call
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when activating a registration failed.
    ///
    /// The error is still returned to the caller after this call.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Container for registered observers.
///
/// Designed to cost a single branch when no observers are registered.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// Install a subscriber (for example `tracing-subscriber`) to see the output.
///
/// ```
/// use ferrous_container::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-container".to_string(),
        }
    }

    /// Observer whose events carry a custom `prefix` field.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        trace!(prefix = %self.prefix, service = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        debug!(prefix = %self.prefix, service = %key, ?duration, "resolved");
    }

    fn failed(&self, key: &Key, error: &DiError) {
        debug!(prefix = %self.prefix, service = %key, %error, "resolution failed");
    }
}

/// Snapshot of [`MetricsObserver`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionMetrics {
    pub resolutions: u64,
    pub failures: u64,
    pub total_time: Duration,
}

/// Observer that counts resolutions and failures.
///
/// ```
/// use ferrous_container::{MetricsObserver, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsObserver::new());
/// let mut services = ServiceCollection::new();
/// services.add_observer(metrics.clone());
/// services.add_transient_factory::<u32, _>(|_| Ok(1)).unwrap();
///
/// let provider = services.build();
/// provider.get_required::<u32>();
/// provider.get_required::<u32>();
/// assert_eq!(metrics.snapshot().resolutions, 2);
/// ```
#[derive(Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ResolutionMetrics {
        ResolutionMetrics {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_time: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
        }
    }

    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn failed(&self, _key: &Key, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
