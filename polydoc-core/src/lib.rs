//! Polydoc core library — domain types, run configuration, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, scanned trees, plan/outcome/report structs
//! - [`config`] — [`RunConfig`], [`FingerprintPolicy`], optional file defaults
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{FingerprintPolicy, RunConfig};
pub use error::ConfigError;
pub use types::{
    Action, ActionKind, ActionOutcome, ComparisonResult, ComparisonStatus, DocumentNode,
    FailureKind, LanguageTag, LanguageTree, OutcomeStatus, RunReport, SyncPlan, SyncRecord,
};
