//! Audit event log for joblock.
//!
//! An optional append-only record of lock activity, written as NDJSON (one JSON object per
//! line) to the path named by `event_log` in the configuration. It exists to answer "who
//! held this lock, and who cleared it?" after the fact, across every process that shares
//! the log file.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: `acquired`, `contended`, `released`, or `lock_clear`
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `key`: The lock key the event concerns
//! - `job`: Optional job name
//! - `details`: Freeform object with action-specific details
//!
//! Writing the log never changes a lock outcome. The coordinator goes through
//! [`EventLog::record`], which downgrades write failures to a warning.
//!
//! ```no_run
//! use joblock::events::{Event, EventAction, EventLog};
//! use serde_json::json;
//!
//! let log = EventLog::new(".joblock/events.ndjson");
//! let event = Event::new(EventAction::LockClear, "lock:Report-acct-1")
//!     .with_details(json!({"forced": true}));
//! log.append(&event)?;
//! # Ok::<(), joblock::error::JoblockError>(())
//! ```

use crate::error::{JoblockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Lock taken at enqueue time
    Acquired,
    /// Enqueue refused because the lock was held
    Contended,
    /// Lock deleted after the job ran or failed
    Released,
    /// Lock cleared manually
    LockClear,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Acquired => write!(f, "acquired"),
            EventAction::Contended => write!(f, "contended"),
            EventAction::Released => write!(f, "released"),
            EventAction::LockClear => write!(f, "lock_clear"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// The lock key.
    pub key: String,

    /// Name of the job the lock belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,

    /// Freeform details object with action-specific information.
    #[serde(default)]
    pub details: Value,
}

impl Event {
    /// Create a new event for `key` stamped with the current time and actor.
    pub fn new(action: EventAction, key: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            key: key.into(),
            job: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the job name for this event.
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            JoblockError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
pub(crate) fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// An NDJSON audit log file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event as one JSON line, creating the file and its directory if needed.
    pub fn append(&self, event: &Event) -> Result<()> {
        let json_line = event.to_ndjson_line()?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| {
                JoblockError::UserError(format!(
                    "failed to create event log directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                JoblockError::UserError(format!(
                    "failed to open event log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        // The whole line goes out in one write on the append handle.
        let line = format!("{}\n", json_line);
        file.write_all(line.as_bytes()).map_err(|e| {
            JoblockError::UserError(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            JoblockError::UserError(format!(
                "failed to sync event log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Append an event, logging a warning instead of failing.
    pub fn record(&self, event: &Event) {
        if let Err(e) = self.append(event) {
            tracing::warn!(action = %event.action, key = %event.key, "audit event dropped: {}", e);
        }
    }

    /// Read every event in the log. A missing file is an empty log.
    pub fn read_all(&self) -> Result<Vec<Event>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(JoblockError::UserError(format!(
                    "failed to read event log '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    JoblockError::UserError(format!(
                        "malformed event on line {} of '{}': {}",
                        i + 1,
                        self.path.display(),
                        e
                    ))
                })
            })
            .collect()
    }
}
