//! Configuration value types and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which shared store holds the lock records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// A directory of lock files (`lock_dir`).
    #[default]
    File,
    /// A Redis server (`redis_url`). Requires the `redis` cargo feature.
    Redis,
    /// Process-local memory. Only useful for embedding and tests.
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::File => write!(f, "file"),
            Backend::Redis => write!(f, "redis"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

pub(super) fn default_lock_dir() -> PathBuf {
    PathBuf::from(".joblock/locks")
}

pub(super) fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

pub(super) fn default_key_prefix() -> String {
    crate::key::DEFAULT_PREFIX.to_string()
}

pub(super) fn default_key_separator() -> String {
    crate::key::DEFAULT_SEPARATOR.to_string()
}

pub(super) fn default_stale_after_minutes() -> u32 {
    120
}
