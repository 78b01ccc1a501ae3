//! Deterministic plan construction.
//!
//! [`build_plan`] is a pure function from classification results plus
//! preloaded document contents to a [`SyncPlan`]. All file reads happen in
//! [`load_sources`], which the runner calls once after scanning — keeping
//! the builder itself total and side-effect-free.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polydoc_core::{
    Action, ActionKind, ComparisonResult, ComparisonStatus, LanguageTag, LanguageTree, SyncPlan,
};

use crate::error::{io_err, SyncError};

/// Preloaded document contents for plan construction.
///
/// Primary contents are keyed by relative path; target contents by
/// (language, relative path). Built once per run from the scanned trees.
#[derive(Debug, Clone, Default)]
pub struct PlanSources {
    primary: BTreeMap<PathBuf, String>,
    targets: BTreeMap<(LanguageTag, PathBuf), String>,
}

impl PlanSources {
    pub fn primary(&self, rel_path: &Path) -> Option<&str> {
        self.primary.get(rel_path).map(String::as_str)
    }

    pub fn target(&self, language: &LanguageTag, rel_path: &Path) -> Option<&str> {
        self.targets
            .get(&(language.clone(), rel_path.to_path_buf()))
            .map(String::as_str)
    }

    pub fn insert_primary(&mut self, rel_path: &Path, content: String) {
        self.primary.insert(rel_path.to_path_buf(), content);
    }

    pub fn insert_target(&mut self, language: &LanguageTag, rel_path: &Path, content: String) {
        self.targets
            .insert((language.clone(), rel_path.to_path_buf()), content);
    }
}

/// Read every scanned document's content into a [`PlanSources`].
///
/// Reads are rooted at each tree's scan root. A document that vanished
/// between scan and read is an I/O error — the trees are immutable for the
/// run and the engine does not chase concurrent edits.
pub fn load_sources(
    primary_tree: &LanguageTree,
    targets: &[(LanguageTag, Option<LanguageTree>)],
) -> Result<PlanSources, SyncError> {
    let mut sources = PlanSources::default();
    for doc in primary_tree.docs() {
        let path = primary_tree.root.join(&doc.rel_path);
        let content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        sources.insert_primary(&doc.rel_path, content);
    }
    for (language, tree) in targets {
        let Some(tree) = tree else { continue };
        for doc in tree.docs() {
            let path = tree.root.join(&doc.rel_path);
            let content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            sources.insert_target(language, &doc.rel_path, content);
        }
    }
    Ok(sources)
}

/// Convert classification results into an ordered action list.
///
/// Missing → Create, Stale → Update (prior target content attached when
/// available), InSync → Skip. Result order is preserved, so the plan
/// inherits the classifier's deterministic ordering.
pub fn build_plan(
    results: &[ComparisonResult],
    sources: &PlanSources,
) -> Result<SyncPlan, SyncError> {
    let mut actions = Vec::with_capacity(results.len());
    for result in results {
        let action = match result.status {
            ComparisonStatus::InSync => Action {
                rel_path: result.rel_path.clone(),
                language: result.language.clone(),
                kind: ActionKind::Skip,
                source_content: String::new(),
                prior_target: None,
            },
            ComparisonStatus::Missing | ComparisonStatus::Stale => {
                let source = sources.primary(&result.rel_path).ok_or_else(|| {
                    SyncError::MissingSource {
                        rel_path: result.rel_path.clone(),
                        language: result.language.clone(),
                    }
                })?;
                let kind = match result.status {
                    ComparisonStatus::Missing => ActionKind::Create,
                    _ => ActionKind::Update,
                };
                Action {
                    rel_path: result.rel_path.clone(),
                    language: result.language.clone(),
                    kind,
                    source_content: source.to_string(),
                    prior_target: sources
                        .target(&result.language, &result.rel_path)
                        .map(str::to_string),
                }
            }
        };
        actions.push(action);
    }
    Ok(SyncPlan { actions })
}
