//! # ferrous-ioc
//!
//! Keyed dependency injection for Rust: a registry that maps requested
//! service identities to construction rules, with lifecycle control,
//! keyed variants, parent/child containers and automatic resolution of
//! types that were never registered.
//!
//! ## Features
//!
//! - **Explicit type catalog**: constructors, implemented traits, generic
//!   shapes and disposal hooks are described once in a [`TypeCatalog`]
//! - **Constructor selection**: greediest or leanest public constructor, a
//!   preferred-constructor marker, or an explicit parameter list
//! - **Open generics**: `IRepository<> -> Repository<>` registrations close
//!   on demand
//! - **Collections**: resolve every registration of a trait in registration order
//! - **Child containers**: lookups bubble up to the parent; disposal cascades down
//! - **Thread-safe**: concurrent registration and resolution with
//!   first-stored-wins singletons
//! - **Circular dependency detection** with the full dependency path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Container, ParamInfo, Resolver, TypeCatalog, TypeInfo};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let catalog = TypeCatalog::new();
//! catalog.describe(
//!     TypeInfo::concrete::<UserService>()
//!         .constructor([ParamInfo::of::<Database>()], |args| {
//!             Ok(UserService { db: args.take()? })
//!         }),
//! );
//!
//! let container = Container::with_catalog(Arc::new(catalog));
//! container
//!     .register_instance(Database { url: "postgres://localhost".to_string() }, None)
//!     .unwrap();
//!
//! // UserService was never registered: it is auto-registered as transient.
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```
//!
//! ## Lifecycles
//!
//! - **Transient** (default): a new instance per resolution
//! - **Singleton**: created on first resolution and cached on the
//!   registration; switch with [`RegistrationHandle::single_instance`]
//!
//! ## Traits and keys
//!
//! ```rust
//! use ferrous_ioc::{Container, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn target(&self) -> &str;
//! }
//!
//! struct Console;
//! impl Logger for Console {
//!     fn target(&self) -> &str { "console" }
//! }
//!
//! struct File;
//! impl Logger for File {
//!     fn target(&self) -> &str { "file" }
//! }
//!
//! let container = Container::new();
//! container.register_trait_instance::<dyn Logger>(Arc::new(Console), None).unwrap();
//! container.register_trait_instance::<dyn Logger>(Arc::new(File), Some("audit")).unwrap();
//!
//! assert_eq!(container.resolve_trait::<dyn Logger>().unwrap().target(), "console");
//! assert_eq!(container.resolve_trait_keyed::<dyn Logger>("audit").unwrap().target(), "file");
//!
//! let all: Vec<String> = container
//!     .resolve_all::<dyn Logger>()
//!     .unwrap()
//!     .iter()
//!     .map(|l| l.target().to_string())
//!     .collect();
//! assert_eq!(all, ["console", "file"]);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod global;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod traits;

mod container;
mod engine;
mod internal;
mod registration;
mod selector;
mod store;

pub use catalog::{Arguments, ConstructorInfo, ParamInfo, TypeBuilder, TypeCatalog, TypeInfo, TypeKind, Visibility};
pub use config::ContainerOptions;
pub use container::{Container, ContainerBuilder};
pub use error::{BoxError, DiError, DiResult};
pub use key::{ServiceKey, TypeToken};
pub use lifetime::Lifecycle;
pub use observer::{DiObserver, SynthesisKind, TracingObserver};
pub use registration::{AnyArc, PlanKind, RegistrationHandle, RegistrationInfo};
pub use traits::{Dispose, DisposeResult, Resolver, ResolverCore};
