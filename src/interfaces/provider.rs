use std::sync::Arc;

/// Provides instances of `T`.
///
/// A provider is registered with
/// [`Injector::register_singleton_provider`](crate::Injector::register_singleton_provider):
/// the provider itself is a singleton, and every resolution of `T` calls
/// [`get`](Provider::get) on it. Whether `get` hands out the same value each
/// time is up to the provider.
pub trait Provider<T: ?Sized>: Send + Sync {
    /// A fully constructed instance of `T`.
    fn get(&self) -> Arc<T>;
}
