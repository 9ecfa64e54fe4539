//! Error types for joblock.
//!
//! Two layers, both built with thiserror:
//! - [`StoreError`] is what a [`LockStore`](crate::store::LockStore) reports. Job error
//!   types absorb it through `From<StoreError>`, so a store failure during acquisition
//!   reaches the enqueue caller through the job's own error type.
//! - [`JoblockError`] is the CLI-facing error; each variant maps to an exit code.

use crate::exit_codes;
use crate::key::LockKey;
use thiserror::Error;

/// Failure talking to the shared lock store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation on a lock file failed.
    #[error("lock store I/O failed for '{key}': {source}")]
    Io {
        /// The lock key (or store path) the operation was acting on.
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Redis command or connection failed.
    #[cfg(feature = "redis")]
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The store cannot serve requests (bad location, unsupported backend, ...).
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.into(),
            source,
        }
    }
}

/// Ready-made error for jobs that want a refused enqueue to be an error.
///
/// Return it from
/// [`LockedJob::handle_enqueue_failure`](crate::job::LockedJob::handle_enqueue_failure)
/// to turn contention into a failure the producer must handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("job is already queued or running under '{key}' (locked at {since})", since = .locked_at.as_deref().unwrap_or("an unknown time"))]
pub struct EnqueueRejected {
    pub key: LockKey,
    pub locked_at: Option<String>,
}

/// Main error type for joblock CLI operations.
#[derive(Error, Debug)]
pub enum JoblockError {
    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// The lock store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The named lock is not held.
    #[error("Lock operation failed: {0}")]
    LockError(String),
}

impl JoblockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            JoblockError::UserError(_) => exit_codes::USER_ERROR,
            JoblockError::Store(_) => exit_codes::STORE_FAILURE,
            JoblockError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }
}

/// Result type alias for joblock CLI operations.
pub type Result<T> = std::result::Result<T, JoblockError>;
