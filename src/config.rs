use serde::{Deserialize, Serialize};

/// Injector settings, usually read from the `[injector]` table of the
/// application config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Warn when a type has no build-time tag.
    pub warn_untagged: bool,
    /// Stop eager initialization at the first failing singleton.
    pub fail_fast: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        InjectorConfig {
            warn_untagged: true,
            fail_fast: true,
        }
    }
}
