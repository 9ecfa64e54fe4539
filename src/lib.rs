//! joblock: fail-fast distributed locks that keep at most one instance of a background
//! job queued or running.
//!
//! A job's lock key is taken with an atomic set-if-absent when the job is enqueued.
//! If the key is already held the enqueue is refused; nothing waits or retries. The key
//! is deleted when the job finishes, whether it succeeds, fails or panics, and again
//! (idempotently) when the dispatcher reports a terminal failure.
//!
//! ```
//! use joblock::{args, JobArg, LockCoordinator, LockedJob, MemoryStore};
//!
//! struct Report;
//!
//! impl LockedJob for Report {
//!     type Error = anyhow::Error;
//!
//!     fn name(&self) -> &str {
//!         "Report"
//!     }
//!
//!     fn perform(&self, _args: &[JobArg]) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let coordinator = LockCoordinator::new(MemoryStore::new());
//! let args = args!["acct-1"];
//!
//! assert!(coordinator.before_enqueue_lock(&Report, &args)?);
//! assert!(!coordinator.before_enqueue_lock(&Report, &args)?);
//!
//! coordinator.perform_locked(&Report, &args)?;
//! assert!(coordinator.before_enqueue_lock(&Report, &args)?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod job;
pub mod key;
pub mod locks;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{EnqueueRejected, StoreError};
pub use job::LockedJob;
pub use key::{JobArg, KeyScheme, LockKey};
pub use locks::{EnqueueOutcome, LockCoordinator, LockRecord};
pub use store::{FileStore, LockStore, MemoryStore};

#[cfg(feature = "redis")]
pub use store::RedisStore;
