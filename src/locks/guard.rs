//! RAII release guard.

use crate::error::StoreError;
use crate::events::{Event, EventAction, EventLog};
use crate::key::LockKey;
use crate::store::LockStore;

/// Deletes a lock key when dropped.
///
/// Dropping happens on every exit from the scope holding the guard, including early
/// returns and panic unwinding. If the delete fails, a warning is logged and the error is
/// otherwise ignored.
pub struct ReleaseGuard<'a, S: LockStore + ?Sized> {
    store: &'a S,
    key: LockKey,
    job: &'a str,
    events: Option<&'a EventLog>,
    released: bool,
}

impl<'a, S: LockStore + ?Sized> ReleaseGuard<'a, S> {
    pub(super) fn new(
        store: &'a S,
        key: LockKey,
        job: &'a str,
        events: Option<&'a EventLog>,
    ) -> Self {
        Self {
            store,
            key,
            job,
            events,
            released: false,
        }
    }

    /// The key this guard will delete.
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Release now and report the store's answer instead of only logging it.
    pub fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.delete()
    }

    fn delete(&self) -> Result<(), StoreError> {
        self.store.delete(self.key.as_str())?;
        tracing::debug!(key = %self.key, job = self.job, "lock released");
        if let Some(log) = self.events {
            log.record(&Event::new(EventAction::Released, self.key.as_str()).with_job(self.job));
        }
        Ok(())
    }
}

impl<S: LockStore + ?Sized> Drop for ReleaseGuard<'_, S> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.delete()
        {
            tracing::warn!(key = %self.key, job = self.job, "failed to release lock: {}", e);
        }
    }
}
