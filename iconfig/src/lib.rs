
use serde::{Deserialize, Serialize};
use toml::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::de::DeserializeOwned;
use tracing::debug;
use rinject::{ConstructError, Injectable, InjectorConfig, Provider, Registrable};

/// Environment variable naming an extra config file, merged last.
pub const CONFIG_ENV: &str = "RINJECT_CONFIG";

/// Standard locations, merged in this order when present.
pub const CONFIG_PATHS: [&str; 3] = [
    "/etc/rinject/config.toml",
    "config/config.toml",
    "./config.toml",
];

/// A flexible configuration container that can hold any valid TOML data
/// and supports merging configurations.
///
/// # Examples
///
/// ```
/// use iconfig::ApplicationConfig;
///
/// let mut base = ApplicationConfig::from_str(r#"
///     [injector]
///     fail_fast = true
/// "#).unwrap();
///
/// let overlay = ApplicationConfig::from_str(r#"
///     [injector]
///     fail_fast = false
/// "#).unwrap();
///
/// base.merge(overlay);
///
/// assert!(!base.injector_config().unwrap().fail_fast);
/// assert!(base.injector_config().unwrap().warn_untagged);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Registrable)]
pub struct ApplicationConfig {
    #[serde(flatten)]
    value: Value,
}

impl fmt::Display for ApplicationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl ApplicationConfig {
    /// An empty configuration.
    pub fn empty() -> Self {
        Self { value: Value::Table(toml::Table::new()) }
    }

    /// Create a new ApplicationConfig from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, anyhow::Error> {
        let value = toml::from_str(s)?;
        Ok(Self { value })
    }

    /// Create a new ApplicationConfig from a TOML file
    pub fn from_file<P: AsRef<Path>>(fname: P) -> Result<Self, anyhow::Error> {
        let path = fname.as_ref();
        if !path.exists() {
            return Err(anyhow::anyhow!("File {} does not exist", path.display()));
        }
        let config = std::fs::read_to_string(path)?;
        Self::from_str(&config)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
    }

    /// Merge another config into this one
    ///
    /// This performs a deep merge where:
    /// - Tables are merged recursively
    /// - Arrays are concatenated
    /// - Other values are overwritten by the new config
    pub fn merge(&mut self, other: Self) {
        self.value = merge_values(&self.value, &other.value);
    }

    /// Get a reference to the underlying TOML value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Get a value by dotted path (e.g., "injector.fail_fast")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.value;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn resolve<T: DeserializeOwned>(&self) -> Result<T, anyhow::Error> {
        let json = serde_json::to_value(self)?;
        serde_json::from_value(json).map_err(|e| anyhow::anyhow!("Failed to convert config: {}", e))
    }

    pub fn resolve_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<T, anyhow::Error> {
        if prefix.is_empty() {
            return self.resolve::<T>();
        }

        let part = self
            .get(prefix)
            .ok_or_else(|| anyhow::anyhow!("No config found for {}", prefix))?;
        let json = serde_json::to_value(part)?;
        serde_json::from_value(json).map_err(|e| anyhow::anyhow!("Failed to convert {}: {}", prefix, e))
    }

    /// Settings of the `[injector]` table, defaults when it is absent.
    pub fn injector_config(&self) -> Result<InjectorConfig, anyhow::Error> {
        if self.get("injector").is_none() {
            return Ok(InjectorConfig::default());
        }
        self.resolve_prefix("injector")
    }
}

fn merge_values(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Table(a_map), Value::Table(b_map)) => {
            let mut result = a_map.clone();
            for (k, v) in b_map {
                let merged = match result.get(k) {
                    Some(existing) => merge_values(existing, v),
                    None => v.clone(),
                };
                result.insert(k.clone(), merged);
            }
            Value::Table(result)
        }
        (Value::Array(a_vec), Value::Array(b_vec)) => {
            let mut result = a_vec.clone();
            result.extend(b_vec.iter().cloned());
            Value::Array(result)
        }
        _ => b.clone(),
    }
}

/// Merge every existing file of `paths`, in order.
pub fn load_from<P: AsRef<Path>>(paths: &[P]) -> Result<ApplicationConfig, anyhow::Error> {
    let mut config: Option<ApplicationConfig> = None;
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        let layer = ApplicationConfig::from_file(path)?;
        debug!(path = %path.display(), "loaded config layer");
        match config.as_mut() {
            Some(config) => config.merge(layer),
            None => config = Some(layer),
        }
    }
    config.ok_or_else(|| anyhow::anyhow!("No config file found"))
}

/// Load from the standard locations, then from `$RINJECT_CONFIG`.
///
/// Standard locations are optional, but a file named by `$RINJECT_CONFIG`
/// must exist.
pub fn load() -> Result<ApplicationConfig, anyhow::Error> {
    let mut paths: Vec<PathBuf> = CONFIG_PATHS.iter().map(PathBuf::from).collect();
    if let Some(extra) = std::env::var_os(CONFIG_ENV) {
        let extra = PathBuf::from(extra);
        if !extra.exists() {
            return Err(anyhow::anyhow!(
                "{} names {}, which does not exist",
                CONFIG_ENV,
                extra.display()
            ));
        }
        paths.push(extra);
    }
    load_from(&paths)
}

/// Provides the loaded [`ApplicationConfig`] to an injector.
///
/// ```no_run
/// use iconfig::{ApplicationConfig, ConfigProvider};
/// use rinject::Injector;
///
/// let injector = Injector::new();
/// injector.register_singleton_provider::<ConfigProvider, ApplicationConfig>();
/// let config = injector.get_instance::<ApplicationConfig>().unwrap();
/// ```
#[derive(Debug, Clone, Registrable)]
pub struct ConfigProvider {
    config: Arc<ApplicationConfig>,
}

impl ConfigProvider {
    pub fn new(config: ApplicationConfig) -> Self {
        ConfigProvider {
            config: Arc::new(config),
        }
    }
}

impl Injectable for ConfigProvider {
    type Dependencies = ();

    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(Self::new(load()?))
    }
}

impl Provider<ApplicationConfig> for ConfigProvider {
    fn get(&self) -> Arc<ApplicationConfig> {
        Arc::clone(&self.config)
    }
}
