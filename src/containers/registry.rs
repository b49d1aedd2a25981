use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::containers::singleton::SingletonProxy;
use crate::error::{InjectorError, Result};
use crate::identity::TypeKey;
use crate::implementation::Instance;
use crate::interfaces::container::Container;

/// Converts the instance an entry produced into the value stored under its
/// key, e.g. `Arc<Impl>` into `Arc<dyn Trait>`. `None` on a type mismatch.
pub(crate) type Binding = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Produces a value from a resolved provider instance.
pub(crate) type Producer = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

pub(crate) enum Registration {
    Singleton {
        proxy: SingletonProxy,
        binding: Option<Binding>,
        expected: &'static str,
    },
    Factory {
        provider: TypeKey,
        produce: Producer,
        expected: &'static str,
    },
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Singleton { proxy, binding, .. } => f
                .debug_struct("Singleton")
                .field("implementation", proxy.implementation())
                .field("mapped", &binding.is_some())
                .finish(),
            Registration::Factory { provider, .. } => f
                .debug_struct("Factory")
                .field("provider", provider)
                .finish(),
        }
    }
}

/// Maps keys to registrations and resolves them, arguments included.
#[derive(Default)]
pub(crate) struct Registry {
    entries: DashMap<TypeKey, Arc<Registration>>,
}

impl Registry {
    /// Installs `registration` under `key`, replacing any previous entry.
    pub fn insert(&self, key: TypeKey, registration: Registration) {
        debug!(key = %key, registration = ?registration, "registered");
        if let Some(previous) = self.entries.insert(key.clone(), Arc::new(registration)) {
            debug!(key = %key, previous = ?previous, "replaced existing registration");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn lookup(&self, key: &TypeKey) -> Result<Arc<Registration>> {
        // Clone out so no shard lock is held while constructing.
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| InjectorError::NotRegistered { key: key.clone() })
    }
}

impl Container for Registry {
    fn resolve_key(&self, key: &TypeKey) -> Result<Instance> {
        let registration = self.lookup(key)?;
        let mismatch = |expected| InjectorError::TypeMismatch {
            key: key.clone(),
            expected,
        };
        match &*registration {
            Registration::Singleton {
                proxy,
                binding,
                expected,
            } => {
                let instance = proxy.resolve(self)?;
                match binding {
                    Some(bind) => bind(instance).ok_or_else(|| mismatch(*expected)),
                    None => Ok(instance),
                }
            }
            Registration::Factory {
                provider,
                produce,
                expected,
            } => {
                let provider = self.resolve_key(provider)?;
                produce(&provider).ok_or_else(|| mismatch(*expected))
            }
        }
    }

    fn contains_key(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }
}
