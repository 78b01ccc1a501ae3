//! The external translation capability.
//!
//! The engine never performs natural-language work itself; it hands a
//! [`TranslateRequest`] to whatever [`Translator`] the caller supplies. The
//! trait is blocking — implementations typically wrap an HTTP client — and
//! the orchestrator calls it through `spawn_blocking`.

use std::sync::Arc;

use thiserror::Error;

use polydoc_core::{Action, FailureKind, LanguageTag};

/// One translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    /// Current primary-language content.
    pub source_content: String,
    pub target_language: LanguageTag,
    /// Existing target content, offered as a translation-memory hint on
    /// updates. Implementations are free to ignore it.
    pub prior_target: Option<String>,
}

impl TranslateRequest {
    pub fn from_action(action: &Action) -> Self {
        Self {
            source_content: action.source_content.clone(),
            target_language: action.language.clone(),
            prior_target: action.prior_target.clone(),
        }
    }
}

/// Ways a translation call can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// Backend asked us to slow down. Transient.
    #[error("rate limited by translation backend")]
    RateLimited,

    /// Backend unreachable or the connection dropped. Transient.
    #[error("translation backend unreachable: {0}")]
    NetworkUnavailable(String),

    /// The backend answered with something unusable. Permanent; never
    /// retried.
    #[error("malformed translation response: {0}")]
    MalformedResponse(String),
}

impl TranslateError {
    /// Whether the retry policy applies.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TranslateError::RateLimited | TranslateError::NetworkUnavailable(_)
        )
    }

    /// Outcome category for reporting.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TranslateError::RateLimited => FailureKind::RateLimited,
            TranslateError::NetworkUnavailable(_) => FailureKind::NetworkUnavailable,
            TranslateError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Blocking translation capability. Implementations must be shareable
/// across worker tasks.
pub trait Translator: Send + Sync {
    fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError>;
}

/// Shared handle the orchestrator clones into workers.
pub type SharedTranslator = Arc<dyn Translator>;
