//! The dependency injector used to register and retrieve services.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::config::InjectorConfig;
use crate::containers::registry::{Binding, Registration, Registry};
use crate::containers::singleton::{SingletonCache, SingletonProxy};
use crate::error::{ConstructError, InjectorError, Result};
use crate::identity::{Registrable, TypeIdentity, TypeKey};
use crate::implementation::{downcast, erase, Implementation, Instance};
use crate::interfaces::container::Container;
use crate::interfaces::injectable::Injectable;
use crate::interfaces::provider::Provider;

/// Entry point for eager initialization.
struct RegisteredType {
    type_id: TypeId,
    key: TypeKey,
}

/// Singleton-scoped dependency injector.
///
/// ```rust
/// use std::sync::Arc;
/// use rinject::{ConstructError, Injectable, Injector, Registrable};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// impl Registrable for dyn Greeter {
///     const TYPE_TAG: Option<&'static str> = Some("doc::Greeter");
/// }
///
/// struct English;
/// impl Registrable for English {
///     const TYPE_TAG: Option<&'static str> = Some("doc::English");
/// }
/// impl Injectable for English {
///     type Dependencies = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> {
///         Ok(English)
///     }
/// }
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let injector = Injector::new();
/// injector.register_singleton_as::<English, dyn Greeter>(|english| english);
///
/// let greeter = injector.get_instance::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub struct Injector {
    config: InjectorConfig,
    identity: TypeIdentity,
    registry: Registry,
    singletons: SingletonCache,
    registered_types: Mutex<Vec<RegisteredType>>,
}

impl Injector {
    pub fn new() -> Self {
        Self::with_config(InjectorConfig::default())
    }

    pub fn with_config(config: InjectorConfig) -> Self {
        Injector {
            identity: TypeIdentity::new(config.warn_untagged),
            config,
            registry: Registry::default(),
            singletons: SingletonCache::new(),
            registered_types: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// The singleton cache backing this injector.
    pub fn singletons(&self) -> &SingletonCache {
        &self.singletons
    }

    /// Register `I` as a singleton under its own key.
    pub fn register_singleton<I: Injectable>(&self) {
        self.install::<I>(Implementation::of::<I>(), None);
    }

    /// Register `I` as the singleton implementation of `M`, usually a trait
    /// object. `cast` performs the coercion, typically `|i| i`.
    pub fn register_singleton_as<I, M>(&self, cast: fn(Arc<I>) -> Arc<M>)
    where
        I: Injectable,
        M: Registrable + ?Sized + Send + Sync,
    {
        let binding: Binding = Arc::new(move |instance: Instance| {
            downcast::<I>(&instance).map(|implementation| erase(cast(implementation)))
        });
        self.install::<M>(Implementation::of::<I>(), Some(binding));
    }

    /// Register a singleton built by a closure.
    pub fn register_singleton_with<I, F>(&self, constructor: F)
    where
        I: Registrable + Send + Sync,
        F: Fn() -> std::result::Result<I, ConstructError> + Send + Sync + 'static,
    {
        self.install::<I>(Implementation::from_fn(constructor), None);
    }

    /// Register an already built singleton. Keys registered earlier for the
    /// same implementation type resolve to it as well.
    pub fn register_instance<I: Registrable + Send + Sync>(&self, instance: I) {
        let instance = Arc::new(instance);
        let proxy = self.singletons.wrap_ready(
            Implementation::from_instance(instance.clone()),
            erase(instance),
        );
        self.insert::<I>(proxy, None);
    }

    /// Register a provider that will provide instances of `M`.
    ///
    /// The provider is itself a singleton and can have dependencies. Each
    /// resolution of `M` calls [`Provider::get`] on it, so eager
    /// initialization of `M` only constructs the provider and discards the
    /// value it hands out.
    pub fn register_singleton_provider<P, M>(&self)
    where
        P: Injectable + Provider<M>,
        M: Registrable + ?Sized + Send + Sync,
    {
        self.register_singleton::<P>();

        let key = self.identity.key_of::<M>();
        let produce = Arc::new(|instance: &Instance| {
            downcast::<P>(instance).map(|provider| erase(provider.get()))
        });
        self.registry.insert(
            key.clone(),
            Registration::Factory {
                provider: TypeKey::of::<P>(),
                produce,
                expected: type_name::<M>(),
            },
        );
        self.remember::<M>(key);
    }

    /// Retrieve the instance registered for `T`.
    pub fn get_instance<T: Registrable + ?Sized + Send + Sync>(&self) -> Result<Arc<T>> {
        let key = self.identity.key_of::<T>();
        let instance = self.registry.resolve_key(&key)?;
        downcast::<T>(&instance).ok_or_else(|| InjectorError::TypeMismatch {
            key,
            expected: type_name::<T>(),
        })
    }

    /// Whether something is registered for `T`. Never constructs.
    pub fn has_instance<T: Registrable + ?Sized>(&self) -> bool {
        self.registry.contains_key(&self.identity.key_of::<T>())
    }

    /// Construct every registered singleton, in registration order.
    ///
    /// Call it once all types are registered so that construction errors
    /// show up at startup rather than at first use.
    pub fn initialize_singleton_instances(&self) -> Result<()> {
        let keys = self.registered_keys();
        let mut failed = Vec::new();

        for key in &keys {
            if let Err(err) = self.registry.resolve_key(key) {
                if self.config.fail_fast {
                    return Err(err);
                }
                error!(key = %key, error = %err, "singleton initialization failed");
                failed.push(key.clone());
            }
        }

        if !failed.is_empty() {
            return Err(InjectorError::Initialization { failed });
        }
        info!(
            entry_points = keys.len(),
            registrations = self.registry.len(),
            constructed = self.singletons.constructed_count(),
            "initialized singleton instances"
        );
        Ok(())
    }

    /// Keys of the registered entry points, in registration order.
    pub fn registered_keys(&self) -> Vec<TypeKey> {
        self.registered_types
            .lock()
            .iter()
            .map(|registered| registered.key.clone())
            .collect()
    }

    fn install<M: Registrable + ?Sized + Send + Sync>(
        &self,
        implementation: Implementation,
        binding: Option<Binding>,
    ) {
        let proxy = self.singletons.wrap(implementation);
        self.insert::<M>(proxy, binding);
    }

    fn insert<M: Registrable + ?Sized + Send + Sync>(
        &self,
        proxy: SingletonProxy,
        binding: Option<Binding>,
    ) {
        let key = self.identity.key_of::<M>();
        self.registry.insert(
            key.clone(),
            Registration::Singleton {
                proxy,
                binding,
                expected: type_name::<M>(),
            },
        );
        self.remember::<M>(key);
    }

    fn remember<M: ?Sized + 'static>(&self, key: TypeKey) {
        let type_id = TypeId::of::<M>();
        let mut registered = self.registered_types.lock();
        if !registered.iter().any(|r| r.type_id == type_id) {
            registered.push(RegisteredType { type_id, key });
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}
