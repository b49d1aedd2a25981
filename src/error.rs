//! Error handling types

use thiserror::Error;

use crate::identity::TypeKey;

/// Error returned by a constructor.
pub type ConstructError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for injector operations
pub type Result<T> = std::result::Result<T, InjectorError>;

#[derive(Error, Debug)]
pub enum InjectorError {
    /// Nothing was registered under the key.
    #[error("no implementation registered for '{key}'")]
    NotRegistered { key: TypeKey },

    /// The constructor of a singleton failed.
    #[error("cannot create instance of '{implementation}': {source}")]
    Construction {
        implementation: &'static str,
        #[source]
        source: ConstructError,
    },

    /// A singleton needs itself while it is being constructed.
    #[error("'{implementation}' was requested again while it was being constructed")]
    ReentrantConstruction { implementation: &'static str },

    /// The entry under `key` holds a value of another type, usually because
    /// two untagged types share an intrinsic name.
    #[error("registration for '{key}' does not produce a '{expected}'")]
    TypeMismatch {
        key: TypeKey,
        expected: &'static str,
    },

    #[error(
        "global injector is not defined, call configure_global_injector before get_global_instance"
    )]
    GlobalInjectorNotConfigured,

    /// Eager initialization finished with failures.
    #[error("{} singleton(s) failed to initialize: {}", .failed.len(), join_keys(.failed))]
    Initialization { failed: Vec<TypeKey> },
}

fn join_keys(keys: &[TypeKey]) -> String {
    keys.iter()
        .map(TypeKey::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_lists_failed_keys() {
        let err = InjectorError::Initialization {
            failed: vec![TypeKey::tagged("a::Db"), TypeKey::tagged("a::Cache")],
        };
        assert_eq!(
            err.to_string(),
            "2 singleton(s) failed to initialize: a::Db, a::Cache"
        );
    }

    #[test]
    fn construction_keeps_source() {
        let err = InjectorError::Construction {
            implementation: "app::Db",
            source: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot create instance of 'app::Db': connection refused"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
