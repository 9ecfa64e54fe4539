//! The lock lifecycle: acquire at enqueue, release after the run or on failure.

use super::guard::ReleaseGuard;
use super::record::LockRecord;
use super::types::EnqueueOutcome;
use crate::config::Config;
use crate::error::StoreError;
use crate::events::{Event, EventAction, EventLog};
use crate::job::LockedJob;
use crate::key::{JobArg, KeyScheme, LockKey};
use crate::store::LockStore;
use serde_json::json;
use std::fmt;

/// Applies the lock protocol to jobs over a shared [`LockStore`].
///
/// The coordinator holds no lock state of its own. Every hook recomputes the key from the
/// job and its arguments and talks to the store, so producers and workers in different
/// processes only need to agree on the store and the key scheme.
///
/// A dispatcher uses it in three places:
///
/// 1. Before admitting a payload: [`enqueue_lock`](Self::enqueue_lock) (or
///    [`before_enqueue_lock`](Self::before_enqueue_lock)); do not enqueue unless the lock
///    was taken.
/// 2. Around execution: [`around_perform_lock`](Self::around_perform_lock) or
///    [`perform_locked`](Self::perform_locked).
/// 3. On terminal failure: [`on_failure_lock`](Self::on_failure_lock).
pub struct LockCoordinator<S> {
    store: S,
    scheme: KeyScheme,
    events: Option<EventLog>,
}

impl<S: LockStore> LockCoordinator<S> {
    /// A coordinator over `store` using the default `lock:` / `-` key scheme.
    pub fn new(store: S) -> Self {
        Self {
            store,
            scheme: KeyScheme::default(),
            events: None,
        }
    }

    pub fn with_key_scheme(mut self, scheme: KeyScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Record acquisitions, contentions and releases in `log`.
    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.events = Some(log);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key_scheme(&self) -> &KeyScheme {
        &self.scheme
    }

    /// The lock key for `job` run with `args`: the job's override, else the derived key.
    pub fn lock_key<J: LockedJob + ?Sized>(&self, job: &J, args: &[JobArg]) -> LockKey {
        job.lock_key(args)
            .unwrap_or_else(|| self.scheme.derive(job.name(), args))
    }

    /// Try to take the lock for `job` with `args`.
    ///
    /// Stores the current time under the key if the key is absent. When the key is already
    /// held, the stored timestamp is read back, the job's
    /// [`handle_enqueue_failure`](LockedJob::handle_enqueue_failure) is called, and the
    /// outcome is `Rejected`; an error from the handler is returned as is. The existing
    /// lock is never modified on contention.
    ///
    /// Store failures are returned as errors and leave the job unadmitted.
    pub fn enqueue_lock<J: LockedJob + ?Sized>(
        &self,
        job: &J,
        args: &[JobArg],
    ) -> Result<EnqueueOutcome, J::Error> {
        let key = self.lock_key(job, args);
        let record = LockRecord::now();

        if self.store.set_if_absent(key.as_str(), record.value())? {
            tracing::debug!(key = %key, job = job.name(), "lock acquired");
            self.record_event(
                Event::new(EventAction::Acquired, key.as_str())
                    .with_job(job.name())
                    .with_details(json!({ "locked_at": record.value() })),
            );
            return Ok(EnqueueOutcome::Enqueued { key });
        }

        let locked_at = self.store.get(key.as_str())?;
        tracing::info!(
            key = %key,
            job = job.name(),
            locked_at = locked_at.as_deref().unwrap_or("unknown"),
            "job already locked, enqueue refused"
        );
        self.record_event(
            Event::new(EventAction::Contended, key.as_str())
                .with_job(job.name())
                .with_details(json!({ "locked_at": locked_at })),
        );

        job.handle_enqueue_failure(&key, locked_at.as_deref())?;
        Ok(EnqueueOutcome::Rejected { key, locked_at })
    }

    /// [`enqueue_lock`](Self::enqueue_lock) reduced to "may this job be enqueued?".
    pub fn before_enqueue_lock<J: LockedJob + ?Sized>(
        &self,
        job: &J,
        args: &[JobArg],
    ) -> Result<bool, J::Error> {
        self.enqueue_lock(job, args)
            .map(|outcome| outcome.is_enqueued())
    }

    /// A guard that deletes the lock for `job` with `args` when dropped.
    ///
    /// For executors that cannot express the run as a closure, such as async workers
    /// holding the guard across await points.
    pub fn release_guard<'a, J: LockedJob + ?Sized>(
        &'a self,
        job: &'a J,
        args: &[JobArg],
    ) -> ReleaseGuard<'a, S> {
        ReleaseGuard::new(
            &self.store,
            self.lock_key(job, args),
            job.name(),
            self.events.as_ref(),
        )
    }

    /// Run `f` and then delete the lock, however `f` exits.
    ///
    /// The lock is deleted after a normal return, after an error return, and while
    /// unwinding from a panic. `f`'s result is returned unchanged. A failed delete is
    /// logged and ignored.
    pub fn around_perform_lock<J, F, R>(&self, job: &J, args: &[JobArg], f: F) -> R
    where
        J: LockedJob + ?Sized,
        F: FnOnce() -> R,
    {
        let _guard = self.release_guard(job, args);
        f()
    }

    /// Run `job.perform(args)` inside [`around_perform_lock`](Self::around_perform_lock).
    pub fn perform_locked<J: LockedJob + ?Sized>(
        &self,
        job: &J,
        args: &[JobArg],
    ) -> Result<(), J::Error> {
        self.around_perform_lock(job, args, || job.perform(args))
    }

    /// Delete the lock after a terminal job failure.
    ///
    /// Deleting a lock that is already gone is a no-op, so this is safe to call after
    /// [`around_perform_lock`](Self::around_perform_lock) has released it. Store errors
    /// are logged and never returned.
    pub fn on_failure_lock<J, E>(&self, job: &J, error: &E, args: &[JobArg])
    where
        J: LockedJob + ?Sized,
        E: fmt::Display + ?Sized,
    {
        let key = self.lock_key(job, args);
        // Only audited when the key was still held; after the run's own release this is a no-op.
        let was_held = match &self.events {
            Some(_) => self.store.get(key.as_str()).map_or(true, |value| value.is_some()),
            None => true,
        };
        match self.store.delete(key.as_str()) {
            Ok(()) if !was_held => {
                tracing::debug!(key = %key, job = job.name(), "lock already released before failure hook");
            }
            Ok(()) => {
                tracing::debug!(key = %key, job = job.name(), error = %error, "lock released after failure");
                self.record_event(
                    Event::new(EventAction::Released, key.as_str())
                        .with_job(job.name())
                        .with_details(json!({ "reason": "failure", "error": error.to_string() })),
                );
            }
            Err(e) => {
                tracing::warn!(key = %key, job = job.name(), "failed to release lock after failure: {}", e);
            }
        }
    }

    /// The record currently held for `job` with `args`, if any.
    pub fn current_record<J: LockedJob + ?Sized>(
        &self,
        job: &J,
        args: &[JobArg],
    ) -> Result<Option<LockRecord>, StoreError> {
        let key = self.lock_key(job, args);
        Ok(self.store.get(key.as_str())?.map(LockRecord::parse))
    }

    fn record_event(&self, event: Event) {
        if let Some(log) = &self.events {
            log.record(&event);
        }
    }
}

impl LockCoordinator<Box<dyn LockStore>> {
    /// Build a coordinator from configuration: the configured store, key scheme and,
    /// when set, the audit log.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let store = config.open_store()?;
        let mut coordinator = Self::new(store).with_key_scheme(config.key_scheme());
        if let Some(path) = &config.event_log {
            coordinator = coordinator.with_event_log(EventLog::new(path));
        }
        Ok(coordinator)
    }
}

impl<S> fmt::Debug for LockCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("scheme", &self.scheme)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
