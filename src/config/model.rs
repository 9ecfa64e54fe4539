//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for joblock.
///
/// This struct represents the contents of `joblock.yaml`. Every field has a default, and
/// unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Store settings
    // =========================================================================
    /// Store backend holding the lock records.
    #[serde(default)]
    pub backend: Backend,

    /// Lock directory for the `file` backend.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Server URL for the `redis` backend.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    // =========================================================================
    // Key settings
    // =========================================================================
    /// Prefix of every derived lock key (default: "lock:").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Separator between job name and arguments (default: "-").
    #[serde(default = "default_key_separator")]
    pub key_separator: String,

    // =========================================================================
    // Reporting settings
    // =========================================================================
    /// Minutes after which `lock list` flags a lock as STALE. Locks never expire.
    #[serde(default = "default_stale_after_minutes")]
    pub stale_after_minutes: u32,

    /// NDJSON audit log of lock activity (disabled when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            lock_dir: default_lock_dir(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            key_separator: default_key_separator(),
            stale_after_minutes: default_stale_after_minutes(),
            event_log: None,
        }
    }
}
