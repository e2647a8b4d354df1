//! Static validation of a service collection.
//!
//! Validation walks the declared constructor parameters of every registration
//! without constructing anything. It applies the same constructor selection
//! rule as the provider, follows closed keys into their open generic
//! specializations, and reports:
//!
//! - **Missing dependencies**: a selected constructor needs a key nothing provides
//! - **Ambiguous constructors**: two constructors tie under the selection rule
//! - **Circular dependencies**: declared parameters lead back to a key under inspection
//! - **Captive transients** (warning): a singleton holds on to a transient forever
//!
//! Factory registrations resolve their dependencies inside the factory body,
//! so validation cannot see through them.

use std::collections::HashMap;
use std::fmt;

use crate::error::DiError;
use crate::implementation::{Dependency, Implementation};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Registry;

/// A validation error that would make a resolution fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required dependency is not registered
    MissingDependency { service: Key, dependency: Key },
    /// Constructor selection is ambiguous
    AmbiguousConstructor {
        service: Key,
        implementation: Key,
        parameters: usize,
    },
    /// Circular dependency detected; the first and last keys are equal
    CircularDependency { cycle: Vec<Key> },
    /// The open generic factory refused to specialize a closed key
    Specialization { service: Key, message: String },
}

/// A validation warning about potentially problematic configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Singleton depends on transient (will always hold the same instance)
    SingletonDependsOnTransient { singleton: Key, transient: Key },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingDependency { service, dependency } => {
                write!(f, "{} depends on unregistered {}", service, dependency)
            }
            ValidationError::AmbiguousConstructor {
                service,
                implementation,
                parameters,
            } => write!(
                f,
                "{} has ambiguous constructors taking {} parameter(s) for {}",
                implementation, parameters, service
            ),
            ValidationError::CircularDependency { cycle } => {
                let names: Vec<String> = cycle.iter().map(|k| k.to_string()).collect();
                write!(f, "circular dependency {}", names.join(" -> "))
            }
            ValidationError::Specialization { service, message } => {
                write!(f, "cannot specialize {}: {}", service, message)
            }
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SingletonDependsOnTransient { singleton, transient } => {
                write!(f, "singleton {} captures transient {}", singleton, transient)
            }
        }
    }
}

/// Result of validation.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Dependency, Implementation, Key, Lifetime, ServiceCollection, ValidationError};
///
/// struct Repository;
/// struct Database;
///
/// let mut services = ServiceCollection::new();
/// services.register(
///     Key::of::<Repository>(),
///     Implementation::of::<Repository>()
///         .constructor([Dependency::of::<Database>()], |_| Ok(Repository)),
///     Lifetime::Transient,
/// ).unwrap();
///
/// let report = services.validate();
/// assert!(!report.is_valid());
/// assert_eq!(report.errors, vec![ValidationError::MissingDependency {
///     service: Key::of::<Repository>(),
///     dependency: Key::of::<Database>(),
/// }]);
/// assert!(services.try_build().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Errors that must be fixed
    pub errors: Vec<ValidationError>,
    /// Warnings about potentially problematic configurations
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// `Ok` when valid, otherwise the report wrapped in `DiError::Validation`.
    pub fn into_result(self) -> Result<ValidationReport, DiError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(DiError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "  error: {}", error)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

type Nodes = Vec<(Implementation, Lifetime)>;

struct Validator<'r> {
    registry: &'r Registry,
    max_depth: usize,
    visits: HashMap<Key, Visit>,
    stack: Vec<Key>,
    specialized: HashMap<Key, Option<(Implementation, Lifetime)>>,
    report: ValidationReport,
}

/// Validates every registration in `registry`.
pub(crate) fn validate(registry: &Registry, max_depth: usize) -> ValidationReport {
    let mut validator = Validator {
        registry,
        max_depth,
        visits: HashMap::new(),
        stack: Vec::new(),
        specialized: HashMap::new(),
        report: ValidationReport::default(),
    };

    // Deterministic order keeps reports stable between runs
    let mut roots: Vec<Key> = registry
        .singles
        .keys()
        .chain(registry.collections.keys())
        .cloned()
        .collect();
    roots.sort_by_cached_key(|k| k.to_string());
    for root in roots {
        validator.visit(&root);
    }
    validator.report
}

impl Validator<'_> {
    fn lifetime_of(&mut self, key: &Key) -> Option<Lifetime> {
        if let Some(single) = self.registry.singles.get(key) {
            return Some(single.lifetime);
        }
        if let Some(collection) = self.registry.collections.get(key) {
            return Some(collection.lifetime);
        }
        self.specialized(key).map(|(_, lifetime)| lifetime)
    }

    fn specialized(&mut self, key: &Key) -> Option<(Implementation, Lifetime)> {
        if let Some(cached) = self.specialized.get(key) {
            return cached.clone();
        }
        let open = self.registry.open_for(key)?;
        let entry = match open.specialize(key) {
            Ok(registration) => Some((registration.implementation, registration.lifetime)),
            Err(error) => {
                self.report.errors.push(ValidationError::Specialization {
                    service: key.clone(),
                    message: error.to_string(),
                });
                None
            }
        };
        self.specialized.insert(key.clone(), entry.clone());
        entry
    }

    fn nodes(&mut self, key: &Key) -> Nodes {
        if let Some(single) = self.registry.singles.get(key) {
            return vec![(single.implementation.clone(), single.lifetime)];
        }
        if let Some(collection) = self.registry.collections.get(key) {
            return collection
                .members
                .iter()
                .map(|m| (m.implementation.clone(), m.lifetime))
                .collect();
        }
        self.specialized(key).into_iter().collect()
    }

    fn visit(&mut self, key: &Key) {
        match self.visits.get(key) {
            Some(Visit::Done) => return,
            Some(Visit::InProgress) => {
                let start = self.stack.iter().position(|k| k == key).unwrap_or(0);
                let mut cycle = self.stack[start..].to_vec();
                cycle.push(key.clone());
                self.report.errors.push(ValidationError::CircularDependency { cycle });
                return;
            }
            None => {}
        }
        // Runaway specializations are reported by the provider at runtime
        if self.stack.len() >= self.max_depth {
            return;
        }

        self.visits.insert(key.clone(), Visit::InProgress);
        self.stack.push(key.clone());

        for (implementation, lifetime) in self.nodes(key) {
            let registry = self.registry;
            let selected = implementation.select_constructor(|dependency| match dependency {
                Dependency::Collection(_) => true,
                Dependency::Service(k) => registry.can_resolve(k),
            });
            let constructor = match selected {
                Ok(constructor) => constructor,
                Err(DiError::AmbiguousConstructor { parameters, .. }) => {
                    self.report.errors.push(ValidationError::AmbiguousConstructor {
                        service: key.clone(),
                        implementation: implementation.key().clone(),
                        parameters,
                    });
                    continue;
                }
                Err(_) => continue,
            };

            for dependency in constructor.parameters() {
                match dependency {
                    Dependency::Service(dep) if !registry.can_resolve(dep) => {
                        self.report.errors.push(ValidationError::MissingDependency {
                            service: key.clone(),
                            dependency: dep.clone(),
                        });
                    }
                    Dependency::Service(dep) => {
                        if lifetime == Lifetime::Singleton && self.lifetime_of(dep) == Some(Lifetime::Transient) {
                            self.report.warnings.push(ValidationWarning::SingletonDependsOnTransient {
                                singleton: key.clone(),
                                transient: dep.clone(),
                            });
                        }
                        self.visit(dep);
                    }
                    Dependency::Collection(dep) => self.visit(dep),
                }
            }
        }

        self.stack.pop();
        self.visits.insert(key.clone(), Visit::Done);
    }
}
