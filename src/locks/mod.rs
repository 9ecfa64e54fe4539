//! Locking subsystem for joblock.
//!
//! This module implements the lock lifecycle that keeps at most one instance of a logical
//! job queued or running:
//!
//! - **Acquire at enqueue**: an atomic set-if-absent of the current timestamp under the
//!   job's lock key. Contention refuses the enqueue immediately; nothing waits or retries.
//! - **Release after the run**: an RAII [`ReleaseGuard`] deletes the key however the run
//!   ends, including panics.
//! - **Release on failure**: an idempotent delete for the dispatcher's failure hook.
//!
//! # Lock Records
//!
//! The value stored under a key is the RFC3339 acquisition timestamp. It is reported to
//! contention handlers and by `joblock lock list`, and never used for expiry. A lock whose
//! holder crashed before either release path ran stays until it is cleared with
//! `joblock lock clear`.

mod coordinator;
mod guard;
mod operations;
mod record;
mod types;


// Re-export public API
pub use coordinator::LockCoordinator;
pub use guard::ReleaseGuard;
pub use operations::{clear_lock, list_locks, show_lock};
pub use record::LockRecord;
pub use types::{EnqueueOutcome, LockInfo};
