//! Split (checker / translator) execution topology.
//!
//! The multi-process deployment is not a different engine: the checker
//! runs [`scan_and_plan`](crate::runner::scan_and_plan), serializes the
//! handoff, and the translator side deserializes and runs
//! [`execute_and_report`](crate::runner::execute_and_report). Here the two
//! halves are tasks joined by an mpsc channel carrying the JSON payload —
//! the same bytes a queue or socket would carry between real processes.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use polydoc_core::{ComparisonResult, RunConfig, SyncPlan};

use crate::cancel::CancelSignal;
use crate::error::{join_err, EngineError};
use crate::runner::{execute_and_report, scan_and_plan, RunOutcome};
use crate::translator::SharedTranslator;

/// Wire payload from checker to translator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanHandoff {
    pub results: Vec<ComparisonResult>,
    pub plan: SyncPlan,
}

impl PlanHandoff {
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Run the pipeline with the plan crossing a serialized channel boundary.
///
/// Plan semantics and the final report are identical to
/// [`runner::run`](crate::runner::run) — only the process seam moves.
pub async fn run_split(
    config: &RunConfig,
    translator: SharedTranslator,
    cancel: CancelSignal,
) -> Result<RunOutcome, EngineError> {
    let (handoff_tx, mut handoff_rx) = mpsc::channel::<Vec<u8>>(1);

    let checker = {
        let config = config.clone();
        tokio::spawn(async move {
            let (results, plan) = scan_and_plan(&config).await?;
            let payload = PlanHandoff { results, plan }
                .encode()
                .map_err(polydoc_sync::SyncError::Json)?;
            handoff_tx
                .send(payload)
                .await
                .map_err(|_| EngineError::ChannelClosed("plan handoff"))?;
            Ok::<(), EngineError>(())
        })
    };

    let bytes = match handoff_rx.recv().await {
        Some(bytes) => bytes,
        None => {
            // Checker died before handing off; surface its error instead of
            // the closed channel.
            checker.await.map_err(|e| join_err("checker", e))??;
            return Err(EngineError::ChannelClosed("plan handoff"));
        }
    };
    checker.await.map_err(|e| join_err("checker", e))??;

    let handoff = PlanHandoff::decode(&bytes).map_err(polydoc_sync::SyncError::Json)?;
    tracing::debug!(
        actions = handoff.plan.len(),
        bytes = bytes.len(),
        "plan crossed the checker/translator boundary",
    );

    let report = execute_and_report(
        config,
        &handoff.results,
        &handoff.plan,
        translator,
        cancel,
    )
    .await?;

    Ok(RunOutcome {
        report,
        plan: handoff.plan,
        results: handoff.results,
    })
}

/// Build a multi-thread runtime and run the split topology to completion.
pub fn run_split_blocking(
    config: &RunConfig,
    translator: SharedTranslator,
    cancel: CancelSignal,
) -> Result<RunOutcome, EngineError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            EngineError::Sync(polydoc_sync::SyncError::Io {
                path: std::path::PathBuf::from("tokio-runtime"),
                source: e,
            })
        })?;
    runtime.block_on(run_split(config, translator, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use polydoc_core::{Action, ActionKind, ComparisonStatus, LanguageTag};

    #[test]
    fn handoff_roundtrips_through_json() {
        let handoff = PlanHandoff {
            results: vec![ComparisonResult {
                rel_path: PathBuf::from("a.md"),
                language: LanguageTag::from("zh"),
                status: ComparisonStatus::Missing,
                reason: "no target file at this path".to_string(),
            }],
            plan: SyncPlan {
                actions: vec![Action {
                    rel_path: PathBuf::from("a.md"),
                    language: LanguageTag::from("zh"),
                    kind: ActionKind::Create,
                    source_content: "# doc\n".to_string(),
                    prior_target: None,
                }],
            },
        };

        let bytes = handoff.encode().expect("encode");
        let decoded = PlanHandoff::decode(&bytes).expect("decode");
        assert_eq!(decoded, handoff);
    }
}
