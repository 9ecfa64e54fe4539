//! The value stored under a lock key.

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// A lock record: the acquisition timestamp written at enqueue time.
///
/// The timestamp is informational. It is reported to contention handlers and by the
/// operational listing, and is never used to expire a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    raw: String,
    acquired_at: Option<DateTime<FixedOffset>>,
}

impl LockRecord {
    /// A record stamped with the current time.
    pub fn now() -> Self {
        Self::parse(Utc::now().to_rfc3339())
    }

    /// Wrap a stored value. Values that are not RFC3339 timestamps (for example records
    /// written by another tool) are kept verbatim with an unknown age.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let acquired_at = DateTime::parse_from_rfc3339(raw.trim()).ok();
        Self { raw, acquired_at }
    }

    /// The stored value exactly as read.
    pub fn value(&self) -> &str {
        &self.raw
    }

    pub fn acquired_at(&self) -> Option<DateTime<FixedOffset>> {
        self.acquired_at
    }

    /// Time since acquisition, if the timestamp could be parsed.
    pub fn age(&self) -> Option<Duration> {
        self.acquired_at
            .map(|at| Utc::now().signed_duration_since(at.with_timezone(&Utc)))
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(age) = self.age() else {
            return "unknown".to_string();
        };
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes.max(0))
        }
    }

    /// Check if the lock is older than `stale_minutes`. Unparseable records are never stale.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age()
            .is_some_and(|age| age.num_minutes() > i64::from(stale_minutes))
    }
}

impl std::fmt::Display for LockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
