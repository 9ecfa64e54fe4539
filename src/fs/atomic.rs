//! Exclusive, all-or-nothing file publication.
//!
//! A lock file must never be observed half-written, and two processes racing to create it
//! must see exactly one winner. Both properties come from the same sequence:
//!
//! 1. Write the content to a uniquely named temporary file in the target directory
//! 2. Sync the temporary file to disk
//! 3. Hard-link it to the target name, which fails with `AlreadyExists` if the target exists
//! 4. Remove the temporary name
//!
//! Unlike `rename()`, `link()` never replaces an existing target, so step 3 is the
//! set-if-absent primitive. Source and target must be on the same filesystem.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Publish `content` at `path` only if nothing exists there yet.
///
/// Returns `Ok(true)` if this call created the file and `Ok(false)` if the path was
/// already taken. Missing parent directories are created.
pub fn publish_exclusive<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<bool> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;

    let linked = fs::hard_link(&temp_path, path);
    // The temp name is private to this call; the published link keeps the inode alive.
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => {
            sync_parent(path);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// Temp names are unique per process and per call: `.{filename}.{pid}.{n}.tmp`.
fn generate_temp_path(target: &Path) -> io::Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid file path"))?;

    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}.{}.tmp", filename, std::process::id(), n);
    Ok(parent.join(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;

    let written = file.write_all(content).and_then(|()| file.sync_all());
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

/// Best effort: persist the new directory entry.
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}
