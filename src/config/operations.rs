//! Config loading, validation, and store construction.

use super::model::Config;
use super::types::Backend;
use crate::error::{JoblockError, Result};
use crate::key::KeyScheme;
use crate::store::{FileStore, LockStore, MemoryStore};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "JOBLOCK_CONFIG";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "joblock.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(JoblockError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            JoblockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Find and load the effective config.
    ///
    /// Resolution order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. The file named by `JOBLOCK_CONFIG`
    /// 3. `joblock.yaml` in the working directory, if present
    /// 4. Built-in defaults
    ///
    /// A file named by 1 or 2 must exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| JoblockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            JoblockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `key_separator` must be non-empty
    /// - `stale_after_minutes` must be positive
    /// - `lock_dir` must be non-empty for the `file` backend
    /// - `redis_url` must be non-empty for the `redis` backend
    pub fn validate(&self) -> Result<()> {
        if self.key_separator.is_empty() {
            return Err(JoblockError::UserError(
                "config validation failed: key_separator must not be empty".to_string(),
            ));
        }

        if self.stale_after_minutes == 0 {
            return Err(JoblockError::UserError(
                "config validation failed: stale_after_minutes must be greater than 0".to_string(),
            ));
        }

        if self.backend == Backend::File && self.lock_dir.as_os_str().is_empty() {
            return Err(JoblockError::UserError(
                "config validation failed: lock_dir must be set for the file backend".to_string(),
            ));
        }

        if self.backend == Backend::Redis && self.redis_url.trim().is_empty() {
            return Err(JoblockError::UserError(
                "config validation failed: redis_url must be set for the redis backend"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// The key scheme described by `key_prefix` and `key_separator`.
    pub fn key_scheme(&self) -> KeyScheme {
        KeyScheme::new(&self.key_prefix, &self.key_separator)
    }

    /// Open the configured store backend.
    pub fn open_store(&self) -> Result<Box<dyn LockStore>> {
        match self.backend {
            Backend::File => Ok(Box::new(FileStore::new(&self.lock_dir))),
            Backend::Memory => Ok(Box::new(MemoryStore::new())),
            Backend::Redis => self.open_redis(),
        }
    }

    #[cfg(feature = "redis")]
    fn open_redis(&self) -> Result<Box<dyn LockStore>> {
        let store = crate::store::RedisStore::open(&self.redis_url)?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "redis"))]
    fn open_redis(&self) -> Result<Box<dyn LockStore>> {
        Err(JoblockError::UserError(
            "the redis backend is not available: joblock was built without the `redis` feature"
                .to_string(),
        ))
    }
}
