//! Operational lock listing, inspection and clearing.
//!
//! These act on records directly by key, outside the job protocol. Clearing is the manual
//! recovery path for a lock left behind by a worker that died before either release path
//! ran.

use super::record::LockRecord;
use super::types::LockInfo;
use crate::config::Config;
use crate::error::{JoblockError, Result};
use crate::key::LockKey;
use crate::store::LockStore;

/// List all held locks under the configured key prefix, sorted by key.
pub fn list_locks<S: LockStore + ?Sized>(store: &S, config: &Config) -> Result<Vec<LockInfo>> {
    let locks = store
        .scan(&config.key_prefix)?
        .into_iter()
        .map(|(key, value)| lock_info(key, value, config))
        .collect();
    Ok(locks)
}

/// Look up one lock by key.
///
/// # Returns
///
/// * `Ok(LockInfo)` - The lock is held
/// * `Err(JoblockError::LockError)` - No lock is held under `key` (exit code 4)
pub fn show_lock<S: LockStore + ?Sized>(store: &S, key: &str, config: &Config) -> Result<LockInfo> {
    match store.get(key)? {
        Some(value) => Ok(lock_info(key.to_string(), value, config)),
        None => Err(not_held(key)),
    }
}

/// Delete a lock by key and return what was removed.
///
/// The caller is responsible for verifying that clearing the lock is appropriate (e.g.,
/// checking --force).
pub fn clear_lock<S: LockStore + ?Sized>(store: &S, key: &str, config: &Config) -> Result<LockInfo> {
    let info = show_lock(store, key, config)?;
    store.delete(key)?;
    Ok(info)
}

fn lock_info(key: String, value: String, config: &Config) -> LockInfo {
    let record = LockRecord::parse(value);
    let is_stale = record.is_stale(config.stale_after_minutes);
    LockInfo {
        key: LockKey::new(key),
        record,
        is_stale,
    }
}

fn not_held(key: &str) -> JoblockError {
    JoblockError::LockError(format!("no lock is held under '{}'", key))
}
