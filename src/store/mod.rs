//! Shared key-value stores that hold lock records.
//!
//! Every backend implements [`LockStore`]: an atomic set-if-absent, a read, an idempotent
//! delete, and a prefix scan used only by the operational listing. The coordinator never
//! keeps state of its own, so all mutual exclusion comes from `set_if_absent` being atomic
//! at the store.
//!
//! Backends:
//! - [`MemoryStore`]: process-local map, for tests and single-process use
//! - [`FileStore`]: one lock file per key in a shared directory
//! - [`RedisStore`]: `SET NX` against a Redis server (feature `redis`)

mod file;
mod memory;
#[cfg(feature = "redis")]
mod redis;


pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use crate::error::StoreError;
use std::sync::Arc;

/// A shared key-value store offering the primitives the lock protocol needs.
pub trait LockStore: Send + Sync {
    /// Store `value` under `key` only if `key` is absent.
    ///
    /// Returns `true` if this call created the key. Must be atomic across every process
    /// sharing the store.
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List every `(key, value)` pair whose key starts with `prefix`, sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}

impl<T: LockStore + ?Sized> LockStore for &T {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        (**self).scan(prefix)
    }
}

impl<T: LockStore + ?Sized> LockStore for Box<T> {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        (**self).scan(prefix)
    }
}

impl<T: LockStore + ?Sized> LockStore for Arc<T> {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        (**self).scan(prefix)
    }
}
