//! Lazy, module-based dependency injection.
//!
//! Bindings are registered by name into modules, and nothing is constructed
//! until something is read. By default, services are held in `Arc<T>` so a
//! container can be shared between threads. This can be changed by disabling
//! default features and enabling the "rc" feature:
//!
//! ```text
//! lazy_injector = {
//!     version = "*",
//!     default_features = false,
//!     features = ["rc"]
//! }
//! ```
//!
//! # Modules
//!
//! A [`Module`] is a named collection of bindings. A module can declare the
//! names of other modules it depends on. When the container runs its
//! resolution pass, every binding of a dependency that the module does not
//! bind itself is copied into the module. A module's own bindings always win,
//! even ones registered after the dependency was declared, because the pass
//! only runs once registration has finished.
//!
//! # Binding kinds
//!
//! Each module has three independent namespaces:
//!
//! - Values: plain data handed out as-is, or an [`Injectable`] that is
//!   constructed on first read.
//! - Services: constructed on first read, then shared by every later read.
//! - Factories: constructed again on every read.
//!
//! # Injectables
//!
//! An [`Injectable`] pairs a constructor with the ordered names of the
//! bindings it depends on. Each name is searched for among values, then
//! services, then factories, then whole modules, and the resolved instances
//! are passed to the constructor in the order they were declared. Any plain
//! function can be made injectable with [`IntoInjectable::inject`].
//!
//! # Resolution
//!
//! Registering a new module schedules the container's resolution pass through
//! its [`Scheduler`]. The pass merges modules with their dependencies and
//! constructs every binding, logging the ones that fail. Reading any binding
//! or calling [`Container::run`] first runs the pass if it has not run yet,
//! so registrations can happen in any order as long as they finish before the
//! first read.
//!
//! # Mocks
//!
//! A mock replaces every binding of one kind and name throughout the
//! container, at any depth of resolution. Mocks are meant for tests and can be
//! removed again with [`Container::remove_mock`] or
//! [`Container::clear_mocks`].
//!
//! # Example
//!
//! ```
//! use lazy_injector::{constant, Container, IntoInjectable, Svc};
//! use std::error::Error;
//!
//! // Something that stores users
//! trait UserStore: Send + Sync {
//!     fn name_of(&self, id: u32) -> Option<String>;
//! }
//!
//! struct SqlStore {
//!     url: String,
//! }
//!
//! impl UserStore for SqlStore {
//!     fn name_of(&self, _id: u32) -> Option<String> {
//!         None
//!     }
//! }
//!
//! struct UserService {
//!     store: Svc<SqlStore>,
//! }
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let container = Container::new();
//!
//!     // Modules can depend on modules that haven't been registered yet.
//!     let users = container.module_with("users", &["db"])?.into_module()?;
//!     users.service(
//!         "user_service",
//!         (|store: Svc<SqlStore>| UserService { store }).inject(&["store"]),
//!     );
//!
//!     let db = container.module("db").into_module()?;
//!     db.value("url", constant(String::from("postgres://localhost")))
//!         .service(
//!             "store",
//!             (|url: Svc<String>| SqlStore { url: (*url).clone() }).inject(&["url"]),
//!         );
//!
//!     // The first read merges "db" into "users" and resolves everything.
//!     let user_service: Svc<UserService> = users.get_service("user_service")?;
//!     assert_eq!("postgres://localhost", user_service.store.url);
//!     assert_eq!(None, user_service.store.name_of(1));
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

#[cfg(not(any(feature = "arc", feature = "rc")))]
compile_error!(
    "Either the 'arc' or 'rc' feature must be enabled (but not both)."
);

#[cfg(all(feature = "arc", feature = "rc"))]
compile_error!(
    "The 'arc' and 'rc' features are mutually exclusive and cannot be enabled together."
);

mod builder;
mod container;
mod engine;
mod merge;
mod module;
mod ordered;
mod overrides;
mod requests;
mod scheduler;
mod services;

pub use builder::*;
pub use container::*;
pub use engine::*;
pub use module::*;
pub use overrides::*;
pub use requests::*;
pub use scheduler::*;
pub use services::*;

use merge::merge_all;
use ordered::OrderedMap;
