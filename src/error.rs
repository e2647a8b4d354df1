//! Error types for the container.

use crate::key::Key;
use crate::validation::ValidationReport;

/// Container errors
///
/// Every variant names the offending key so that a misconfiguration can be
/// diagnosed from the message alone.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{DiError, Key, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotRegistered(key)) => {
///         assert_eq!(key, Key::of::<String>());
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_container::{DiError, Key};
///
/// let circular = DiError::CircularDependency(vec![
///     Key::open("A", 0),
///     Key::open("B", 0),
///     Key::open("A", 0),
/// ]);
/// assert_eq!(circular.to_string(), "Circular dependency: A<> -> B<> -> A<>");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// A Single, Collection or OpenGeneric registration already claims the key
    #[error("Service already registered: {0}")]
    AlreadyRegistered(Key),
    /// Open service and open implementation disagree on their type parameters
    #[error(
        "Arity mismatch: service {service} takes {service_arity} type argument(s) \
         but implementation {implementation} takes {implementation_arity}"
    )]
    ArityMismatch {
        service: Key,
        service_arity: usize,
        implementation: Key,
        implementation_arity: usize,
    },
    /// Nothing is registered for the key
    #[error("Service not registered: {0}")]
    NotRegistered(Key),
    /// More than one constructor qualifies under the selection rule
    #[error(
        "Ambiguous constructor for {implementation}: {candidates} constructors take \
         {parameters} resolvable parameter(s)"
    )]
    AmbiguousConstructor {
        implementation: Key,
        parameters: usize,
        candidates: usize,
    },
    /// Construction graph cycle (path from the root request to the repeat)
    #[error("Circular dependency: {}", join_chain(.0))]
    CircularDependency(Vec<Key>),
    /// A constructor parameter could not be resolved
    #[error("Unable to resolve {dependency} while constructing {}: {source}", join_chain(.chain))]
    UnresolvableDependency {
        chain: Vec<Key>,
        dependency: Key,
        source: Box<DiError>,
    },
    /// Implementation descriptor without any constructor
    #[error("Implementation has no constructor: {0}")]
    NoConstructor(Key),
    /// Instance downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum construction depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A factory reported a failure of its own
    #[error("Construction of {implementation} failed: {message}")]
    Construction { implementation: Key, message: String },
    /// Static validation found problems
    #[error("Container validation failed:\n{0}")]
    Validation(ValidationReport),
}

impl DiError {
    /// Error for a factory that cannot produce its instance.
    pub fn construction(implementation: Key, message: impl Into<String>) -> Self {
        DiError::Construction {
            implementation,
            message: message.into(),
        }
    }

    /// The innermost error of an `UnresolvableDependency` chain.
    pub fn root_cause(&self) -> &DiError {
        match self {
            DiError::UnresolvableDependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn join_chain(chain: &[Key]) -> String {
    chain
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for container operations
///
/// ```rust
/// use ferrous_container::{DiResult, DiError, Key};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NotRegistered(Key::of::<u8>()))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
