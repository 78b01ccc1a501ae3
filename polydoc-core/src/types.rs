//! Domain types for the polydoc reconciliation engine.
//!
//! All path fields use `PathBuf`; relative paths are the document identity
//! key and are always relative to a language root. Plan and outcome types
//! are serializable via serde + serde_json — the plan is the wire format
//! between the checker and translator halves of a split run.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed language tag, e.g. `"en"` or `"zh"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LanguageTag(pub String);

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LanguageTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LanguageTag {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Scanned documents
// ---------------------------------------------------------------------------

/// One scanned document inside a language tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Path relative to the language root; the identity key together with
    /// the language tag.
    pub rel_path: PathBuf,
    pub language: LanguageTag,
    /// SHA-256 hex digest of the content under the configured policy.
    pub fingerprint: String,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

/// All documents of one language, sorted by relative path.
///
/// Immutable once built for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTree {
    pub language: LanguageTag,
    /// Absolute root directory the tree was scanned from.
    pub root: PathBuf,
    docs: Vec<DocumentNode>,
}

impl LanguageTree {
    /// Build a tree from scanned nodes; sorts by relative path so iteration
    /// order is deterministic.
    pub fn new(language: LanguageTag, root: PathBuf, mut docs: Vec<DocumentNode>) -> Self {
        docs.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Self {
            language,
            root,
            docs,
        }
    }

    pub fn docs(&self) -> &[DocumentNode] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Look up a document by relative path.
    pub fn get(&self, rel_path: &Path) -> Option<&DocumentNode> {
        self.docs
            .binary_search_by(|d| d.rel_path.as_path().cmp(rel_path))
            .ok()
            .map(|i| &self.docs[i])
    }
}

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

/// Last successfully synced fingerprint pairing for one (path, language).
///
/// A record exists only after at least one successful non-dry-run action
/// for that pair; the engine never deletes records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub primary_fingerprint: String,
    pub target_fingerprint: String,
    pub synced_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classification of a (primary document, target language) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Missing,
    Stale,
    InSync,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonStatus::Missing => write!(f, "missing"),
            ComparisonStatus::Stale => write!(f, "stale"),
            ComparisonStatus::InSync => write!(f, "in-sync"),
        }
    }
}

/// Why a pairing received its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub rel_path: PathBuf,
    pub language: LanguageTag,
    pub status: ComparisonStatus,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What kind of work an action carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Skip,
}

impl ActionKind {
    /// Skip actions exist for reporting completeness and carry no work.
    pub fn is_generative(self) -> bool {
        !matches!(self, ActionKind::Skip)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Update => write!(f, "update"),
            ActionKind::Skip => write!(f, "skip"),
        }
    }
}

/// One planned unit of work for a (path, language) pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub rel_path: PathBuf,
    pub language: LanguageTag,
    pub kind: ActionKind,
    /// Current primary-language content; empty for Skip.
    #[serde(default)]
    pub source_content: String,
    /// Existing target content, passed to the translator as a
    /// translation-memory hint on Update. The translator may ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_target: Option<String>,
}

/// Deterministic ordered list of actions: primary tree path order, then
/// configured language order. Two runs over unchanged inputs produce
/// byte-identical plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub actions: Vec<Action>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions that require a translator call.
    pub fn pending(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.kind.is_generative())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Done,
    Error,
}

/// Terminal failure category for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    NetworkUnavailable,
    MalformedResponse,
    Io,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate-limited"),
            FailureKind::NetworkUnavailable => write!(f, "network-unavailable"),
            FailureKind::MalformedResponse => write!(f, "malformed-response"),
            FailureKind::Io => write!(f, "io"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of executing (or skipping) one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub rel_path: PathBuf,
    pub language: LanguageTag,
    pub kind: ActionKind,
    pub status: OutcomeStatus,
    /// Translator attempts consumed; 0 for Skip and never-dispatched actions.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl ActionOutcome {
    pub fn done(action: &Action, attempts: u32) -> Self {
        Self {
            rel_path: action.rel_path.clone(),
            language: action.language.clone(),
            kind: action.kind,
            status: OutcomeStatus::Done,
            attempts,
            failure_kind: None,
            failure_detail: None,
        }
    }

    pub fn failed(action: &Action, attempts: u32, kind: FailureKind, detail: String) -> Self {
        Self {
            rel_path: action.rel_path.clone(),
            language: action.language.clone(),
            kind: action.kind,
            status: OutcomeStatus::Error,
            attempts,
            failure_kind: Some(kind),
            failure_detail: Some(detail),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Aggregated run summary. Counters are commutative — completion order of
/// concurrent actions does not affect the totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub missing: usize,
    pub stale: usize,
    pub in_sync: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when the orchestrator was never invoked.
    pub dry_run: bool,
    /// Outcomes in plan order (empty on dry-run).
    #[serde(default)]
    pub outcomes: Vec<ActionOutcome>,
}

impl RunReport {
    /// Whether any action ended in an error outcome.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
