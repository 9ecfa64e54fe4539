//! Shared helpers for unit tests: a working-directory guard, an in-memory dispatcher
//! that drives the lock hooks the way a queue and worker would, and sample jobs.

use crate::job::LockedJob;
use crate::key::{JobArg, LockKey};
use crate::locks::LockCoordinator;
use crate::store::LockStore;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

// ============================================================================
// Test dispatcher
// ============================================================================

/// A queue plus a worker, calling the lock hooks at the points a real dispatcher would.
pub(crate) struct TestQueue<'c, S: LockStore> {
    coordinator: &'c LockCoordinator<S>,
    queued: VecDeque<Vec<JobArg>>,
}

impl<'c, S: LockStore> TestQueue<'c, S> {
    pub(crate) fn new(coordinator: &'c LockCoordinator<S>) -> Self {
        Self {
            coordinator,
            queued: VecDeque::new(),
        }
    }

    /// Admit the payload only if its lock was taken. Returns whether it was queued.
    pub(crate) fn enqueue<J: LockedJob>(
        &mut self,
        job: &J,
        args: Vec<JobArg>,
    ) -> Result<bool, J::Error> {
        let admitted = self.coordinator.before_enqueue_lock(job, &args)?;
        if admitted {
            self.queued.push_back(args);
        }
        Ok(admitted)
    }

    pub(crate) fn len(&self) -> usize {
        self.queued.len()
    }

    /// Run the oldest payload inside the release region, then call the failure hook if
    /// the job failed. Returns `None` when the queue is empty.
    pub(crate) fn work_one<J>(&mut self, job: &J) -> Option<Result<(), J::Error>>
    where
        J: LockedJob,
        J::Error: std::fmt::Display,
    {
        let args = self.queued.pop_front()?;
        let result = self.coordinator.perform_locked(job, &args);
        if let Err(e) = &result {
            self.coordinator.on_failure_lock(job, e, &args);
        }
        Some(result)
    }
}

// ============================================================================
// Sample jobs
// ============================================================================

/// Succeeds and counts its runs.
#[derive(Default)]
pub(crate) struct Report {
    pub(crate) runs: AtomicUsize,
}

impl LockedJob for Report {
    type Error = anyhow::Error;

    fn name(&self) -> &str {
        "Report"
    }

    fn perform(&self, _args: &[JobArg]) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always fails, optionally by panicking.
pub(crate) struct Exploding {
    pub(crate) panics: bool,
}

impl LockedJob for Exploding {
    type Error = anyhow::Error;

    fn name(&self) -> &str {
        "Exploding"
    }

    fn perform(&self, _args: &[JobArg]) -> anyhow::Result<()> {
        if self.panics {
            panic!("exploded while running");
        }
        anyhow::bail!("exploded while running")
    }
}

/// Records every contention it is told about and raises one shared error value.
#[derive(Default)]
pub(crate) struct SpecialFailure {
    pub(crate) error: Arc<SpecialError>,
    pub(crate) seen: Mutex<Vec<(LockKey, Option<String>)>>,
}

#[derive(Debug, Default, thiserror::Error)]
#[error("enqueue refused by handler")]
pub(crate) struct SpecialError;

/// Errors of [`SpecialFailure`]: the handler's shared error, or a store failure.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SpecialFailureError {
    #[error(transparent)]
    Handler(Arc<SpecialError>),
    #[error(transparent)]
    Store(#[from] crate::error::StoreError),
}

impl LockedJob for SpecialFailure {
    type Error = SpecialFailureError;

    fn name(&self) -> &str {
        "SpecialFailure"
    }

    fn perform(&self, _args: &[JobArg]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle_enqueue_failure(
        &self,
        key: &LockKey,
        locked_at: Option<&str>,
    ) -> Result<(), Self::Error> {
        self.seen
            .lock()
            .unwrap()
            .push((key.clone(), locked_at.map(str::to_string)));
        Err(SpecialFailureError::Handler(Arc::clone(&self.error)))
    }
}

/// One instance at a time regardless of arguments.
pub(crate) struct NetworkGraph;

impl LockedJob for NetworkGraph {
    type Error = anyhow::Error;

    fn name(&self) -> &str {
        "NetworkGraph"
    }

    fn perform(&self, _args: &[JobArg]) -> anyhow::Result<()> {
        Ok(())
    }

    fn lock_key(&self, _args: &[JobArg]) -> Option<LockKey> {
        Some(LockKey::new("network-graph"))
    }
}
