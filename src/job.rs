//! The job side of the lock protocol.
//!
//! A job opts into locking by implementing [`LockedJob`]. Only `name` and `perform` are
//! required; the key override and the contention handler have defaults, so a plain job
//! gets the derived key and a silent refusal when a duplicate is already queued.
//!
//! ```
//! use joblock::{JobArg, LockedJob, LockKey};
//!
//! struct UpdateNetworkGraph;
//!
//! impl LockedJob for UpdateNetworkGraph {
//!     type Error = anyhow::Error;
//!
//!     fn name(&self) -> &str {
//!         "UpdateNetworkGraph"
//!     }
//!
//!     fn perform(&self, _args: &[JobArg]) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     // One graph update at a time, whatever the repository.
//!     fn lock_key(&self, _args: &[JobArg]) -> Option<LockKey> {
//!         Some(LockKey::new("network-graph"))
//!     }
//! }
//! ```

use crate::error::StoreError;
use crate::key::{JobArg, LockKey};

/// A background job whose instances are deduplicated by a lock key.
pub trait LockedJob {
    /// Error returned by `perform` and by the contention handler.
    ///
    /// Store failures during acquisition are converted into this type, so they reach the
    /// producer through the same channel as the job's own errors.
    type Error: From<StoreError>;

    /// Job name used in the default lock key.
    fn name(&self) -> &str;

    /// Run the job.
    fn perform(&self, args: &[JobArg]) -> Result<(), Self::Error>;

    /// Custom lock key for `args`. `None` selects the derived default.
    ///
    /// Receives the same arguments as `perform`. Must be deterministic: the key is
    /// recomputed at enqueue, after the run, and on failure.
    fn lock_key(&self, args: &[JobArg]) -> Option<LockKey> {
        let _ = args;
        None
    }

    /// Called when an enqueue finds the lock already held.
    ///
    /// `locked_at` is the stored acquisition timestamp, or `None` if the lock vanished
    /// before it could be read. Returning an error makes the enqueue fail with that error.
    fn handle_enqueue_failure(
        &self,
        key: &LockKey,
        locked_at: Option<&str>,
    ) -> Result<(), Self::Error> {
        let _ = (key, locked_at);
        Ok(())
    }
}
