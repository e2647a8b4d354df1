//! Container options.

/// Default limit on nested constructions per resolution.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Tunables applied when a provider is built.
///
/// With the `config` feature the options (de)serialize with serde so a host
/// application can embed them in its own configuration.
///
/// ```rust
/// use ferrous_container::{ContainerOptions, ServiceCollection};
///
/// let mut services = ServiceCollection::new();
/// services.with_options(ContainerOptions::default().max_depth(64));
/// assert_eq!(services.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Maximum depth of a construction chain before `DepthExceeded`
    pub max_depth: usize,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
