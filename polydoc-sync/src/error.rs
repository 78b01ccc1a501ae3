//! Error types for polydoc-sync.

use std::path::PathBuf;

use thiserror::Error;

use polydoc_core::LanguageTag;

/// All errors that can arise from ledger, plan, and write operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (ledger).
    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The plan builder was handed a non-in-sync classification without the
    /// primary content needed to act on it. The runner always preloads
    /// source content, so this indicates a wiring bug, not user error.
    #[error("no source content for {language}/{}", rel_path.display())]
    MissingSource {
        rel_path: PathBuf,
        language: LanguageTag,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
