//! Process-wide injector for application entry points.
//!
//! Libraries should take an [`Injector`] explicitly; only the final
//! application is expected to configure and read the global one.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::containers::injector::Injector;
use crate::error::{InjectorError, Result};
use crate::identity::Registrable;

static GLOBAL_INJECTOR: RwLock<Option<Arc<Injector>>> = RwLock::new(None);

/// Set the global injector. A later call replaces the previous one.
pub fn configure_global_injector(injector: Arc<Injector>) {
    let previous = GLOBAL_INJECTOR.write().replace(injector);
    if previous.is_some() {
        debug!("replaced global injector");
    }
}

/// The global injector, if one was configured.
pub fn global_injector() -> Option<Arc<Injector>> {
    GLOBAL_INJECTOR.read().clone()
}

/// [`Injector::get_instance`] on the global injector.
pub fn get_global_instance<T: Registrable + ?Sized + Send + Sync>() -> Result<Arc<T>> {
    let injector = global_injector().ok_or(InjectorError::GlobalInjectorNotConfigured)?;
    injector.get_instance::<T>()
}
