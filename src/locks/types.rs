//! Lock outcome and information structures.

use super::record::LockRecord;
use crate::key::LockKey;

/// Result of trying to take a job's lock at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The lock was free and is now held; the job may be enqueued.
    Enqueued { key: LockKey },
    /// The lock was already held; the job must not be enqueued.
    Rejected {
        key: LockKey,
        /// Timestamp stored by the holder, if it could still be read.
        locked_at: Option<String>,
    },
}

impl EnqueueOutcome {
    pub fn is_enqueued(&self) -> bool {
        matches!(self, EnqueueOutcome::Enqueued { .. })
    }

    pub fn key(&self) -> &LockKey {
        match self {
            EnqueueOutcome::Enqueued { key } | EnqueueOutcome::Rejected { key, .. } => key,
        }
    }
}

/// Information about a held lock, as reported by `list`/`show`.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock key.
    pub key: LockKey,

    /// The stored record.
    pub record: LockRecord,

    /// Whether the lock is older than the configured stale threshold.
    pub is_stale: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (locked at: {}, age: {}{})",
            self.key,
            self.record,
            self.record.age_string(),
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}
