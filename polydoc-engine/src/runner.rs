//! Single-process reconciliation pipeline.
//!
//! Stage order: validate config → scan primary (fatal on error) → scan
//! target languages concurrently (a failed target scan demotes that
//! language to an absent tree) → load ledger → classify → preload contents
//! → build plan → execute (skipped entirely on dry-run) → report.
//!
//! The two public stage functions, [`scan_and_plan`] and
//! [`execute_and_report`], are also the checker and translator halves of
//! the split topology — both deployments run exactly this code.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use polydoc_core::{ComparisonResult, LanguageTag, LanguageTree, RunConfig, RunReport, SyncPlan};
use polydoc_scan::scan_tree;
use polydoc_sync::{compare, ledger, plan, report};

use crate::cancel::CancelSignal;
use crate::error::{join_err, EngineError};
use crate::orchestrator::{execute_plan, ExecutionContext};
use crate::translator::SharedTranslator;

/// Everything a completed run hands back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub report: RunReport,
    pub plan: SyncPlan,
    /// Classification behind the plan, in plan order.
    pub results: Vec<ComparisonResult>,
}

/// Checker half: scan, classify, and build the plan. No writes.
pub async fn scan_and_plan(
    config: &RunConfig,
) -> Result<(Vec<ComparisonResult>, SyncPlan), EngineError> {
    config.validate()?;

    let primary_tree = scan_language(config, &config.primary)
        .await
        .map_err(|source| EngineError::PrimaryScan {
            language: config.primary.clone(),
            source,
        })?;
    tracing::info!(
        language = %config.primary,
        documents = primary_tree.len(),
        "scanned primary tree",
    );

    let mut handles = Vec::new();
    for language in config.target_languages() {
        let language = language.clone();
        let root = config.language_root(&language);
        let policy = config.fingerprint;
        handles.push((
            language.clone(),
            tokio::task::spawn_blocking(move || scan_tree(&root, language, policy)),
        ));
    }

    let mut targets: Vec<(LanguageTag, Option<LanguageTree>)> = Vec::with_capacity(handles.len());
    for (language, handle) in handles {
        let scanned = handle.await.map_err(|e| join_err("target scan", e))?;
        match scanned {
            Ok(tree) => {
                tracing::info!(language = %language, documents = tree.len(), "scanned target tree");
                targets.push((language, Some(tree)));
            }
            Err(err) => {
                tracing::warn!(
                    language = %language,
                    error = %err,
                    "target tree unavailable, all documents will be missing",
                );
                targets.push((language, None));
            }
        }
    }

    let ledger = {
        let base_dir = config.base_dir.clone();
        tokio::task::spawn_blocking(move || ledger::load(&base_dir))
            .await
            .map_err(|e| join_err("ledger load", e))??
    };

    let sources = {
        let primary_tree = primary_tree.clone();
        let targets = targets.clone();
        tokio::task::spawn_blocking(move || plan::load_sources(&primary_tree, &targets))
            .await
            .map_err(|e| join_err("content load", e))??
    };

    let results = compare::classify_all(&primary_tree, &targets, &ledger, &sources);
    let sync_plan = plan::build_plan(&results, &sources)?;
    Ok((results, sync_plan))
}

/// Translator half: execute the plan (unless dry-run) and fold the report.
pub async fn execute_and_report(
    config: &RunConfig,
    results: &[ComparisonResult],
    sync_plan: &SyncPlan,
    translator: SharedTranslator,
    cancel: CancelSignal,
) -> Result<RunReport, EngineError> {
    if config.dry_run {
        tracing::info!(
            actions = sync_plan.len(),
            pending = sync_plan.pending().count(),
            "dry-run: plan reported, nothing executed",
        );
        return Ok(report::build_report(results, sync_plan, Vec::new(), true));
    }

    let ledger = {
        let base_dir = config.base_dir.clone();
        tokio::task::spawn_blocking(move || ledger::load(&base_dir))
            .await
            .map_err(|e| join_err("ledger load", e))??
    };

    let ctx = ExecutionContext {
        config: Arc::new(config.clone()),
        translator,
        ledger: Arc::new(Mutex::new(ledger)),
        cancel,
    };
    let outcomes = execute_plan(sync_plan, &ctx).await;
    Ok(report::build_report(results, sync_plan, outcomes, false))
}

/// Run the whole pipeline in this process.
pub async fn run(
    config: &RunConfig,
    translator: SharedTranslator,
    cancel: CancelSignal,
) -> Result<RunOutcome, EngineError> {
    let (results, sync_plan) = scan_and_plan(config).await?;
    let report = execute_and_report(config, &results, &sync_plan, translator, cancel).await?;
    Ok(RunOutcome {
        report,
        plan: sync_plan,
        results,
    })
}

/// Build a multi-thread runtime and run to completion. CLI entry point.
pub fn run_blocking(
    config: &RunConfig,
    translator: SharedTranslator,
    cancel: CancelSignal,
) -> Result<RunOutcome, EngineError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| EngineError::Sync(polydoc_sync::SyncError::Io {
            path: std::path::PathBuf::from("tokio-runtime"),
            source: e,
        }))?;
    runtime.block_on(run(config, translator, cancel))
}

async fn scan_language(
    config: &RunConfig,
    language: &LanguageTag,
) -> Result<LanguageTree, polydoc_scan::ScanError> {
    let root = config.language_root(language);
    let language = language.clone();
    let policy = config.fingerprint;
    match tokio::task::spawn_blocking(move || scan_tree(&root, language, policy)).await {
        Ok(result) => result,
        Err(err) => Err(polydoc_scan::ScanError::Io {
            path: Path::new("scan task").to_path_buf(),
            source: std::io::Error::other(err.to_string()),
        }),
    }
}
