//! Error types for polydoc-engine.

use thiserror::Error;

use polydoc_core::{ConfigError, LanguageTag};
use polydoc_scan::ScanError;
use polydoc_sync::SyncError;

/// Run-fatal engine failures.
///
/// Per-action failures never surface here — the orchestrator converts them
/// into outcomes. Anything of this type means the run aborted before a plan
/// could be executed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The primary tree could not be scanned. Unlike target trees, this is
    /// fatal — without the canonical document set there is nothing to plan.
    #[error("failed to scan primary tree '{language}': {source}")]
    PrimaryScan {
        language: LanguageTag,
        #[source]
        source: ScanError,
    },

    /// Ledger load or plan construction failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },

    /// The plan channel between the checker and translator halves closed
    /// before the handoff completed.
    #[error("plan channel closed: {0}")]
    ChannelClosed(&'static str),
}

pub(crate) fn join_err(task: &'static str, err: tokio::task::JoinError) -> EngineError {
    EngineError::Join {
        task,
        message: err.to_string(),
    }
}
