//! Singleton-scoped dependency injection.
//!
//! Types are registered in an [`Injector`] under a [`TypeKey`], constructed
//! lazily at most once, and resolved as `Arc<T>`. Trait objects are
//! registered through [`Injector::register_singleton_as`], and factories
//! through [`Injector::register_singleton_provider`].
//!
//! ```rust
//! use std::sync::Arc;
//! use rinject::{ConstructError, Injectable, Injector, Registrable};
//!
//! #[derive(Registrable)]
//! struct Settings {
//!     name: &'static str,
//! }
//!
//! impl Injectable for Settings {
//!     type Dependencies = ();
//!     fn construct(_: ()) -> Result<Self, ConstructError> {
//!         Ok(Settings { name: "demo" })
//!     }
//! }
//!
//! #[derive(Registrable, Injectable)]
//! struct Service {
//!     #[inject]
//!     settings: Arc<Settings>,
//! }
//!
//! let injector = Injector::new();
//! injector.register_singleton::<Settings>();
//! injector.register_singleton::<Service>();
//! injector.initialize_singleton_instances().unwrap();
//!
//! let service = injector.get_instance::<Service>().unwrap();
//! assert_eq!(service.settings.name, "demo");
//! ```

pub mod config;
pub mod containers;
pub mod error;
pub mod global;
pub mod identity;
pub mod implementation;
pub mod interfaces;

pub use config::InjectorConfig;
pub use containers::injector::Injector;
pub use containers::singleton::{SingletonCache, SingletonProxy};
pub use error::{ConstructError, InjectorError, Result};
pub use global::{configure_global_injector, get_global_instance, global_injector};
pub use identity::{Registrable, TypeIdentity, TypeKey};
pub use implementation::{Arguments, Implementation, Instance};
pub use interfaces::container::Container;
pub use interfaces::injectable::{Dependencies, Injectable};
pub use interfaces::provider::Provider;

pub use rinject_derives::{registrable, Injectable, Registrable};
