//! Redis-backed lock store.
//!
//! Acquisition is a single `SET key value NX`, which Redis executes atomically, so any
//! number of producers on any number of hosts agree on one winner. No expiry is set on
//! the key; a lock left behind by a crashed worker stays until it is cleared.

use super::LockStore;
use crate::error::StoreError;

const SCAN_BATCH: usize = 100;

/// Lock store talking to a Redis server.
///
/// Each operation opens its own connection from the client, so the store is `Sync` and
/// can be shared between threads without a pool.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a store for `url` (for example `redis://127.0.0.1:6379/`).
    ///
    /// Only the URL is validated here; the server is first contacted by an operation.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(RedisStore { client })
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        Ok(self.client.get_connection()?)
    }
}

impl LockStore for RedisStore {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .query(&mut conn)?;
        Ok(reply.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection()?;
        let value: Option<String> = redis::cmd("GET").arg(key).query(&mut conn)?;
        Ok(value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let _removed: i64 = redis::cmd("DEL").arg(key).query(&mut conn)?;
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut conn = self.connection()?;
        let pattern = format!("{}*", escape_glob(prefix));

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query(&mut conn)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort();
        keys.dedup();

        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<String> = redis::cmd("GET").arg(&key).query(&mut conn)?;
            // Released between SCAN and GET.
            if let Some(value) = value {
                found.push((key, value));
            }
        }
        Ok(found)
    }
}

/// Escape Redis glob metacharacters so the prefix matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
