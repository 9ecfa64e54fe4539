//! Lock key derivation.
//!
//! A job's default lock key is its name followed by its argument values, all joined with a
//! separator under a common prefix: `lock:Report-acct-1` for `Report` with `["acct-1"]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default prefix placed in front of every derived key.
pub const DEFAULT_PREFIX: &str = "lock:";

/// Default separator between the job name and each argument.
pub const DEFAULT_SEPARATOR: &str = "-";

/// A single scalar job argument.
///
/// Arguments are serialized untagged, so `["acct-1", 7, true, null]` in JSON deserializes
/// into `[Str, Int, Bool, Null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl JobArg {
    /// Parse a command-line token into the scalar it most likely names.
    ///
    /// `null`, `true`/`false`, integers and floats are recognized; anything else is a string.
    pub fn parse_lossy(token: &str) -> Self {
        match token {
            "null" => JobArg::Null,
            "true" => JobArg::Bool(true),
            "false" => JobArg::Bool(false),
            _ => {
                if let Ok(i) = token.parse::<i64>() {
                    return JobArg::Int(i);
                }
                match token.parse::<f64>() {
                    Ok(f) if f.is_finite() => JobArg::Float(f),
                    _ => JobArg::Str(token.to_string()),
                }
            }
        }
    }
}

/// The textual form used in lock keys. `Null` renders as the empty string.
impl fmt::Display for JobArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobArg::Null => Ok(()),
            JobArg::Bool(b) => write!(f, "{}", b),
            JobArg::Int(i) => write!(f, "{}", i),
            JobArg::Float(x) => write!(f, "{}", x),
            JobArg::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for JobArg {
    fn from(value: &str) -> Self {
        JobArg::Str(value.to_string())
    }
}

impl From<String> for JobArg {
    fn from(value: String) -> Self {
        JobArg::Str(value)
    }
}

impl From<i64> for JobArg {
    fn from(value: i64) -> Self {
        JobArg::Int(value)
    }
}

impl From<i32> for JobArg {
    fn from(value: i32) -> Self {
        JobArg::Int(value.into())
    }
}

impl From<u32> for JobArg {
    fn from(value: u32) -> Self {
        JobArg::Int(value.into())
    }
}

impl From<f64> for JobArg {
    fn from(value: f64) -> Self {
        JobArg::Float(value)
    }
}

impl From<bool> for JobArg {
    fn from(value: bool) -> Self {
        JobArg::Bool(value)
    }
}

impl<T: Into<JobArg>> From<Option<T>> for JobArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(JobArg::Null, Into::into)
    }
}

/// Build a `Vec<JobArg>` from heterogeneous scalars.
///
/// ```
/// let args = joblock::args!["acct-1", 42, true];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::JobArg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::JobArg::from($arg)),+]
    };
}

/// A derived lock key, the identity of a logical job instance in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(key: impl Into<String>) -> Self {
        LockKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for LockKey {
    fn from(value: String) -> Self {
        LockKey(value)
    }
}

impl From<&str> for LockKey {
    fn from(value: &str) -> Self {
        LockKey(value.to_string())
    }
}

/// Prefix and separator used to derive default lock keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: String,
    separator: String,
}

impl Default for KeyScheme {
    fn default() -> Self {
        KeyScheme {
            prefix: DEFAULT_PREFIX.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl KeyScheme {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        KeyScheme {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Derive the default key for `name` invoked with `args`.
    ///
    /// The result is `prefix + name + separator + args joined by separator`. With no
    /// arguments the trailing separator is kept (`lock:Name-`).
    ///
    /// Two different argument lists can produce the same key when an argument's text
    /// contains the separator (`["a-b"]` and `["a", "b"]`) or when values of different
    /// types share a textual form (`Int(1)`, `Float(1.0)` and `Str("1")`). Jobs that need
    /// a stronger guarantee should override
    /// [`LockedJob::lock_key`](crate::job::LockedJob::lock_key).
    pub fn derive(&self, name: &str, args: &[JobArg]) -> LockKey {
        let joined = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&self.separator);
        LockKey(format!(
            "{}{}{}{}",
            self.prefix, name, self.separator, joined
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_report_key() {
        let key = KeyScheme::default().derive("Report", &args!["acct-1"]);
        assert_eq!(key.as_str(), "lock:Report-acct-1");
    }

    #[test]
    fn zero_args_keep_trailing_separator() {
        let key = KeyScheme::default().derive("Nightly", &[]);
        assert_eq!(key.as_str(), "lock:Nightly-");
    }

    #[test]
    fn mixed_scalars_render_in_order() {
        let key = KeyScheme::default().derive("Sync", &args![7, "eu", true, 2.5]);
        assert_eq!(key.as_str(), "lock:Sync-7-eu-true-2.5");
    }

    #[test]
    fn null_renders_empty() {
        let key = KeyScheme::default().derive("Sync", &args![None::<i64>, 3]);
        assert_eq!(key.as_str(), "lock:Sync--3");
    }

    #[test]
    fn derivation_is_deterministic() {
        let scheme = KeyScheme::default();
        let args = args!["acct-1", 9];
        assert_eq!(scheme.derive("Report", &args), scheme.derive("Report", &args));
    }

    #[test]
    fn distinct_args_give_distinct_keys() {
        let scheme = KeyScheme::default();
        let a = scheme.derive("Report", &args!["acct-1"]);
        let b = scheme.derive("Report", &args!["acct-2"]);
        let c = scheme.derive("Invoice", &args!["acct-1"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn separator_inside_argument_collides() {
        let scheme = KeyScheme::default();
        assert_eq!(
            scheme.derive("Job", &args!["a-b"]),
            scheme.derive("Job", &args!["a", "b"])
        );
    }

    #[test]
    fn custom_scheme_uses_its_prefix_and_separator() {
        let scheme = KeyScheme::new("jobs/", ":");
        let key = scheme.derive("Report", &args!["a-b", 1]);
        assert_eq!(key.as_str(), "jobs/Report:a-b:1");
    }

    #[test]
    fn job_args_deserialize_untagged() {
        let args: Vec<JobArg> = serde_json::from_str(r#"["acct-1", 7, 1.5, false, null]"#).unwrap();
        assert_eq!(
            args,
            vec![
                JobArg::Str("acct-1".into()),
                JobArg::Int(7),
                JobArg::Float(1.5),
                JobArg::Bool(false),
                JobArg::Null,
            ]
        );
    }

    #[test]
    fn parse_lossy_recognizes_scalars() {
        assert_eq!(JobArg::parse_lossy("42"), JobArg::Int(42));
        assert_eq!(JobArg::parse_lossy("-3"), JobArg::Int(-3));
        assert_eq!(JobArg::parse_lossy("2.5"), JobArg::Float(2.5));
        assert_eq!(JobArg::parse_lossy("true"), JobArg::Bool(true));
        assert_eq!(JobArg::parse_lossy("null"), JobArg::Null);
        assert_eq!(JobArg::parse_lossy("acct-1"), JobArg::Str("acct-1".into()));
        assert_eq!(JobArg::parse_lossy("inf"), JobArg::Str("inf".into()));
    }

    #[test]
    fn lock_key_serializes_as_plain_string() {
        let key = LockKey::new("lock:Report-1");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"lock:Report-1\"");
    }
}
