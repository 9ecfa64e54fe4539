//! Lock store backed by a directory of lock files.
//!
//! Each key maps to `<escaped-key>.lock` in the store directory. The file holds the record
//! value verbatim, apart from the hashed names described below. Creation goes through
//! [`publish_exclusive`], so concurrent processes on the same filesystem see exactly one
//! winner and never a partially written record.
//!
//! # Name escaping
//!
//! Bytes outside `[A-Za-z0-9._-]` are written as `%XX` (uppercase hex), as is a leading
//! `.` so lock files are never hidden. `lock:Report-acct 1` becomes
//! `lock%3AReport-acct%201.lock`.
//!
//! An escaped name longer than [`MAX_STEM_LEN`] bytes would break the filesystem's name
//! limit, so such keys are stored as `~<sha256 hex>.lock` instead. `~` never survives
//! escaping, so the two forms cannot clash. A hashed file starts with the escaped key on
//! its own line, followed by the value, which is how [`FileStore::scan`] recovers the key.
//!
//! Keys that differ only in letter case share one file on case-insensitive filesystems
//! (the macOS and Windows defaults). Keep such stores on a case-sensitive volume, or use
//! keys that never differ by case alone.

use super::LockStore;
use crate::error::StoreError;
use crate::fs::publish_exclusive;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LOCK_EXT: &str = ".lock";
const HASHED_MARK: char = '~';

/// Longest escaped key used directly as a file name stem. Leaves room for the extension
/// and the temp-file decoration under a 255-byte name limit.
pub(crate) const MAX_STEM_LEN: usize = 200;

/// Directory-backed lock store shared by every process that can see the directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the lock directory. It is created on first acquisition.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the lock file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        LockName::for_key(key).path_in(&self.root)
    }
}

/// How a key is spelled on disk.
enum LockName {
    Escaped(String),
    Hashed { stem: String, header: String },
}

impl LockName {
    fn for_key(key: &str) -> Self {
        let escaped = escape_key(key);
        if escaped.len() <= MAX_STEM_LEN {
            return LockName::Escaped(escaped);
        }
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        LockName::Hashed {
            stem: format!("{}{}", HASHED_MARK, digest),
            header: escaped,
        }
    }

    fn path_in(&self, root: &Path) -> PathBuf {
        let stem = match self {
            LockName::Escaped(stem) => stem,
            LockName::Hashed { stem, .. } => stem,
        };
        root.join(format!("{}{}", stem, LOCK_EXT))
    }

    /// File contents holding `value`.
    fn encode(&self, value: &str) -> String {
        match self {
            LockName::Escaped(_) => value.to_string(),
            LockName::Hashed { header, .. } => format!("{}\n{}", header, value),
        }
    }
}

/// Split a hashed lock file into its key and value.
fn decode_hashed(contents: &str) -> Option<(String, String)> {
    let (header, value) = contents.split_once('\n')?;
    Some((unescape_key(header)?, value.to_string()))
}

impl LockStore for FileStore {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let name = LockName::for_key(key);
        publish_exclusive(name.path_in(&self.root), name.encode(value).as_bytes())
            .map_err(|e| StoreError::io(key, e))
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let name = LockName::for_key(key);
        let contents = match fs::read_to_string(name.path_in(&self.root)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        };
        match name {
            LockName::Escaped(_) => Ok(Some(contents)),
            LockName::Hashed { .. } => match decode_hashed(&contents) {
                Some((stored_key, value)) if stored_key == key => Ok(Some(value)),
                _ => Err(StoreError::io(
                    key,
                    io::Error::new(io::ErrorKind::InvalidData, "lock file header does not match key"),
                )),
            },
        }
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let root_label = self.root.display().to_string();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(root_label, e)),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(root_label.clone(), e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            // Temp files from in-flight acquisitions start with '.'.
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(LOCK_EXT) else {
                continue;
            };

            if stem.starts_with(HASHED_MARK) {
                let contents = match fs::read_to_string(entry.path()) {
                    Ok(contents) => contents,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(StoreError::io(name, e)),
                };
                if let Some((key, value)) = decode_hashed(&contents)
                    && key.starts_with(prefix)
                {
                    found.push((key, value));
                }
                continue;
            }

            let Some(key) = unescape_key(stem) else {
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(value) => found.push((key, value)),
                // Released between listing and reading.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(key, e)),
            }
        }

        found.sort();
        Ok(found)
    }
}

/// Encode a key as a portable file name stem.
pub(crate) fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, b) in key.bytes().enumerate() {
        let plain = b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || (b == b'.' && i > 0);
        if plain {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Reverse [`escape_key`]. Returns `None` for names this store did not produce.
pub(crate) fn unescape_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            // from_str_radix alone would take a sign, as in "%+1".
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
