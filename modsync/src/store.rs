//! Thin filesystem wrapper.
//!
//! All filesystem access in the update engine goes through these helpers so
//! that I/O failures carry the path they happened on. Cleanup helpers are
//! best-effort: they log failures instead of escalating, so a cleanup
//! problem never masks the success or failure verdict that preceded it.

use std::fs;
use std::path::Path;

use crate::error::{UpdaterError, UpdaterResult};

/// Whether a file exists at the given path.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Read a file's full contents.
pub fn read_bytes(path: &Path) -> UpdaterResult<Vec<u8>> {
    fs::read(path).map_err(|e| UpdaterError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write bytes to a file, creating parent directories as needed.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> UpdaterResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, bytes).map_err(|e| UpdaterError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy a file over a destination, overwriting it and creating parent
/// directories as needed.
pub fn copy_file(from: &Path, to: &Path) -> UpdaterResult<()> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| UpdaterError::CopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })
}

/// Create a directory and all of its parents.
pub fn create_dir_all(path: &Path) -> UpdaterResult<()> {
    fs::create_dir_all(path).map_err(|e| UpdaterError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Delete a single file.
pub fn delete_file(path: &Path) -> UpdaterResult<()> {
    fs::remove_file(path).map_err(|e| UpdaterError::DeleteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Best-effort recursive directory removal.
///
/// Logs and swallows failures so no temp data accumulates silently while the
/// caller's verdict stays intact.
pub fn remove_dir_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging directory");
    }
}
