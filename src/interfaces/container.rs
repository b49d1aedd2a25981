use crate::error::Result;
use crate::identity::TypeKey;
use crate::implementation::Instance;

/// Key-level resolution. Singleton proxies resolve their arguments through
/// it, so the registry itself acts as the argument engine.
pub trait Container: Send + Sync {
    fn resolve_key(&self, key: &TypeKey) -> Result<Instance>;

    fn contains_key(&self, key: &TypeKey) -> bool;
}
