//! Atomic document writer.
//!
//! Generated translations are written to `<path>.polydoc.tmp` and renamed
//! into place, so a crash mid-write never leaves a half-translated document
//! at the target path. Parent directories are created on demand — a target
//! language tree may not exist yet when its first translation lands.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Atomically write `content` to `path`.
///
/// On rename failure the temp file is removed and the original target (if
/// any) is left untouched.
pub fn write_document(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.polydoc.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}
