//! # ferrous-container
//!
//! Service-location and dependency-injection container with constructor
//! injection, open generic registrations and thread-safe singletons.
//!
//! ## Features
//!
//! - **Two lifetimes**: Singleton (built once, shared) and Transient (built per request)
//! - **Constructor injection**: declared parameter lists or factory functions
//! - **Open generics**: one registration for `Repository<_>`, specialized per closed key
//! - **Collections**: ordered multi-implementation registrations, injectable as a sequence
//! - **Cycle detection**: same-thread and cross-thread cycles fail with the full path
//! - **Exactly-once singletons**: concurrent first requests share one construction
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_container::{Dependency, Implementation, Key, Lifetime, ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! }).unwrap();
//! services.register(
//!     Key::of::<UserService>(),
//!     Implementation::of::<UserService>()
//!         .constructor([Dependency::of::<Database>()], |args| {
//!             Ok(UserService { db: args.get::<Database>(0)? })
//!         }),
//!     Lifetime::Transient,
//! ).unwrap();
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Collections
//!
//! ```rust
//! use ferrous_container::{Implementation, Key, Lifetime, ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! trait Handler: Send + Sync { fn name(&self) -> &'static str; }
//! struct Audit;
//! struct Mail;
//! impl Handler for Audit { fn name(&self) -> &'static str { "audit" } }
//! impl Handler for Mail { fn name(&self) -> &'static str { "mail" } }
//!
//! let mut services = ServiceCollection::new();
//! services.register_collection(
//!     Key::of::<dyn Handler>(),
//!     [
//!         Implementation::of::<Audit>().constructor([], |_| Ok(Arc::new(Audit) as Arc<dyn Handler>)),
//!         Implementation::of::<Mail>().constructor([], |_| Ok(Arc::new(Mail) as Arc<dyn Handler>)),
//!     ],
//!     Lifetime::Singleton,
//! ).unwrap();
//!
//! let provider = services.build();
//! let names: Vec<_> = provider.get_all_trait::<dyn Handler>().unwrap()
//!     .iter().map(|h| h.name()).collect();
//! assert_eq!(names, ["audit", "mail"]);
//! ```

pub mod collection;
pub mod descriptors;
pub mod error;
pub mod implementation;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod options;
pub mod provider;
pub mod traits;
pub mod validation;

// Internal modules
mod builder;
mod cache;
mod internal;
mod registration;

pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use implementation::{Arguments, Constructor, Dependency, Implementation, OpenImplementation};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver, MetricsObserver, ResolutionMetrics};
pub use options::ContainerOptions;
pub use provider::{ResolverContext, ServiceProvider};
pub use registration::{AnyArc, RegistrationKind};
pub use traits::{Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
