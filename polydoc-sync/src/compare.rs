//! Classification of (primary document, target language) pairings.
//!
//! Decision table, evaluated against the current fingerprints and the
//! ledger's last-synced record:
//!
//! | target file | ledger record | primary drifted | target drifted | status  |
//! |-------------|---------------|-----------------|----------------|---------|
//! | absent      | —             | —               | —              | Missing |
//! | present     | absent        | —               | —              | Stale   |
//! | present     | present       | no              | no             | InSync  |
//! | present     | present       | yes             | any            | Stale   |
//! | present     | present       | no              | yes            | Stale   |
//!
//! Either side drifting from the last known-good pairing invalidates the
//! sync; the engine prefers re-generation over silently accepting
//! divergence.

use polydoc_core::{
    ComparisonResult, ComparisonStatus, DocumentNode, LanguageTag, LanguageTree, SyncRecord,
};

use crate::analyzer;
use crate::ledger::LedgerFile;
use crate::plan::PlanSources;

/// Classify one pairing from fingerprints and the ledger record.
pub fn classify(
    primary: &DocumentNode,
    language: &LanguageTag,
    target: Option<&DocumentNode>,
    record: Option<&SyncRecord>,
) -> ComparisonResult {
    let (status, reason) = match (target, record) {
        (None, _) => (
            ComparisonStatus::Missing,
            "no target file at this path".to_string(),
        ),
        (Some(_), None) => (
            ComparisonStatus::Stale,
            "target exists but was never synced".to_string(),
        ),
        (Some(target), Some(record)) => {
            let primary_drifted = primary.fingerprint != record.primary_fingerprint;
            let target_drifted = target.fingerprint != record.target_fingerprint;
            match (primary_drifted, target_drifted) {
                (false, false) => (
                    ComparisonStatus::InSync,
                    "fingerprints match last sync".to_string(),
                ),
                (true, _) => (
                    ComparisonStatus::Stale,
                    "primary content changed since last sync".to_string(),
                ),
                (false, true) => (
                    ComparisonStatus::Stale,
                    "target content changed since last sync".to_string(),
                ),
            }
        }
    };

    ComparisonResult {
        rel_path: primary.rel_path.clone(),
        language: language.clone(),
        status,
        reason,
    }
}

/// Classify every (primary document × target language) pairing.
///
/// Pure over its inputs. Iteration order is the plan order: primary tree
/// path order, then the given language order. An absent tree (scan failed
/// or directory never created) marks every pairing for that language
/// Missing. For never-synced pairs a direct content similarity ratio is
/// appended to the reason when both sides' contents are available.
pub fn classify_all(
    primary_tree: &LanguageTree,
    targets: &[(LanguageTag, Option<LanguageTree>)],
    ledger: &LedgerFile,
    sources: &PlanSources,
) -> Vec<ComparisonResult> {
    let mut results = Vec::with_capacity(primary_tree.len() * targets.len());
    for doc in primary_tree.docs() {
        for (language, tree) in targets {
            let target = tree.as_ref().and_then(|t| t.get(&doc.rel_path));
            let record = ledger.get(language, &doc.rel_path);
            let mut result = classify(doc, language, target, record);

            if target.is_some() && record.is_none() {
                if let (Some(source), Some(prior)) = (
                    sources.primary(&doc.rel_path),
                    sources.target(language, &doc.rel_path),
                ) {
                    let ratio = analyzer::similarity(source, prior);
                    result.reason = format!("{} (similarity {ratio:.2})", result.reason);
                }
            }
            results.push(result);
        }
    }
    results
}
