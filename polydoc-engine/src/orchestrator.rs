//! Bounded-concurrency plan execution.
//!
//! Non-skip actions are queued in plan order and drained by a pool of at
//! most `concurrency` workers, so no more than that many translator calls
//! are ever in flight. Each action runs its own retry schedule; a failed
//! action is recorded and the batch continues. Outcomes are reassembled
//! into plan order regardless of completion order.
//!
//! Per successful action: strip reasoning tags → structural validation →
//! atomic document write → ledger record upsert + save. The ledger is only
//! touched after the write landed, so content and ledger never disagree.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};

use polydoc_core::{
    Action, ActionOutcome, FailureKind, FingerprintPolicy, RunConfig, SyncPlan, SyncRecord,
};
use polydoc_scan::fingerprint;
use polydoc_sync::{analyzer, ledger, writer, LedgerFile};

use crate::cancel::CancelSignal;
use crate::retry::RetryPolicy;
use crate::translator::{SharedTranslator, TranslateError, TranslateRequest};

/// Everything a worker needs to execute actions.
#[derive(Clone)]
pub struct ExecutionContext {
    pub config: Arc<RunConfig>,
    pub translator: SharedTranslator,
    pub ledger: Arc<Mutex<LedgerFile>>,
    pub cancel: CancelSignal,
}

/// Execute every action of the plan and return outcomes in plan order.
///
/// Skip actions are recorded as Done with zero attempts without touching
/// the queue. Cancellation stops dispatch; already-queued actions are
/// recorded as cancelled and in-flight ones race the signal.
pub async fn execute_plan(plan: &SyncPlan, ctx: &ExecutionContext) -> Vec<ActionOutcome> {
    let total = plan.len();
    let mut slots: Vec<Option<ActionOutcome>> = vec![None; total];

    let (work_tx, work_rx) = mpsc::channel::<(usize, Action)>(total.max(1));
    let mut queued = 0usize;
    for (idx, action) in plan.actions.iter().enumerate() {
        if action.kind.is_generative() {
            work_tx
                .send((idx, action.clone()))
                .await
                .expect("work queue sized to the plan");
            queued += 1;
        } else {
            slots[idx] = Some(ActionOutcome::done(action, 0));
        }
    }
    drop(work_tx);

    if queued == 0 {
        return slots.into_iter().flatten().collect();
    }

    let worker_count = ctx.config.concurrency.min(queued).max(1);
    tracing::debug!(queued, workers = worker_count, "dispatching plan");

    let work_rx = Arc::new(Mutex::new(work_rx));
    let (done_tx, mut done_rx) = mpsc::channel::<(usize, ActionOutcome)>(queued);

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let work_rx = work_rx.clone();
        let done_tx = done_tx.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let next = { work_rx.lock().await.recv().await };
                let Some((idx, action)) = next else { break };

                let outcome = if ctx.cancel.is_cancelled() {
                    ActionOutcome::failed(
                        &action,
                        0,
                        FailureKind::Cancelled,
                        "run cancelled before dispatch".to_string(),
                    )
                } else {
                    run_action(&action, &ctx).await
                };

                if done_tx.send((idx, outcome)).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(done_tx);

    while let Some((idx, outcome)) = done_rx.recv().await {
        slots[idx] = Some(outcome);
    }
    for handle in handles {
        let _ = handle.await;
    }

    slots.into_iter().flatten().collect()
}

/// Run one action to a terminal outcome: translate (with retry), validate,
/// write, record.
async fn run_action(action: &Action, ctx: &ExecutionContext) -> ActionOutcome {
    let mut cancel_rx = ctx.cancel.subscribe();
    let mut schedule = RetryPolicy::from_config(&ctx.config).schedule();

    loop {
        let attempt = schedule.begin_attempt();
        let translator = ctx.translator.clone();
        let request = TranslateRequest::from_action(action);
        let call = tokio::task::spawn_blocking(move || translator.translate(&request));

        let result = tokio::select! {
            _ = cancel_rx.recv() => {
                return ActionOutcome::failed(
                    action,
                    attempt,
                    FailureKind::Cancelled,
                    "run cancelled mid-flight".to_string(),
                );
            }
            joined = call => match joined {
                Ok(result) => result,
                Err(err) => Err(TranslateError::MalformedResponse(format!(
                    "translator panicked: {err}"
                ))),
            },
        };

        match result {
            Ok(generated) => return commit(action, generated, schedule.attempts(), ctx).await,
            Err(err) if err.is_transient() => {
                let Some(delay) = schedule.backoff() else {
                    tracing::warn!(
                        path = %action.rel_path.display(),
                        language = %action.language,
                        attempts = schedule.attempts(),
                        "retry budget exhausted",
                    );
                    return ActionOutcome::failed(
                        action,
                        schedule.attempts(),
                        err.failure_kind(),
                        err.to_string(),
                    );
                };
                tracing::debug!(
                    path = %action.rel_path.display(),
                    language = %action.language,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient translation failure, backing off",
                );
                tokio::select! {
                    _ = cancel_rx.recv() => {
                        return ActionOutcome::failed(
                            action,
                            schedule.attempts(),
                            FailureKind::Cancelled,
                            "run cancelled during backoff".to_string(),
                        );
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(err) => {
                return ActionOutcome::failed(
                    action,
                    schedule.attempts(),
                    err.failure_kind(),
                    err.to_string(),
                );
            }
        }
    }
}

/// Validate generated content, write it, and update the ledger.
async fn commit(
    action: &Action,
    generated: String,
    attempts: u32,
    ctx: &ExecutionContext,
) -> ActionOutcome {
    let cleaned = analyzer::strip_reasoning_tags(&generated);
    let content = match ctx.config.fingerprint {
        FingerprintPolicy::NormalizeEol => cleaned.replace("\r\n", "\n"),
        FingerprintPolicy::Exact => cleaned,
    };

    if let Err(issue) = analyzer::structure_preserved(&action.source_content, &content) {
        return ActionOutcome::failed(
            action,
            attempts,
            FailureKind::MalformedResponse,
            issue.to_string(),
        );
    }

    let path = ctx.config.document_path(&action.language, &action.rel_path);
    let write_content = content.clone();
    let write_path = path.clone();
    let written =
        tokio::task::spawn_blocking(move || writer::write_document(&write_path, &write_content))
            .await;
    match written {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            return ActionOutcome::failed(action, attempts, FailureKind::Io, err.to_string());
        }
        Err(err) => {
            return ActionOutcome::failed(
                action,
                attempts,
                FailureKind::Io,
                format!("write task join failure: {err}"),
            );
        }
    }

    let record = SyncRecord {
        primary_fingerprint: fingerprint(&action.source_content, ctx.config.fingerprint),
        target_fingerprint: fingerprint(&content, ctx.config.fingerprint),
        synced_at: Utc::now(),
    };

    // Guard held across the save so concurrent ledger writes serialize and
    // no upsert is lost to a stale snapshot.
    let mut guard = ctx.ledger.lock().await;
    guard.upsert(&action.language, &action.rel_path, record);
    let snapshot = guard.clone();
    let base_dir = ctx.config.base_dir.clone();
    let saved = tokio::task::spawn_blocking(move || ledger::save(&base_dir, &snapshot)).await;
    drop(guard);

    match saved {
        Ok(Ok(())) => ActionOutcome::done(action, attempts),
        Ok(Err(err)) => ActionOutcome::failed(
            action,
            attempts,
            FailureKind::Io,
            format!("ledger save failed: {err}"),
        ),
        Err(err) => ActionOutcome::failed(
            action,
            attempts,
            FailureKind::Io,
            format!("ledger task join failure: {err}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    use tempfile::TempDir;

    use polydoc_core::{ActionKind, LanguageTag, OutcomeStatus};

    use crate::translator::Translator;

    const SOURCE: &str = "# Title\n\nPlain body text long enough to pass the length gate.\n";

    /// Returns the source unchanged — structurally always valid.
    struct EchoTranslator;

    impl Translator for EchoTranslator {
        fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
            Ok(request.source_content.clone())
        }
    }

    /// Fails permanently when the source contains the marker.
    struct MarkerFailTranslator;

    impl Translator for MarkerFailTranslator {
        fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
            if request.source_content.contains("FAIL") {
                Err(TranslateError::MalformedResponse("refused".to_string()))
            } else {
                Ok(request.source_content.clone())
            }
        }
    }

    /// Rate-limits the first `failures` calls, then succeeds.
    struct FlakyTranslator {
        failures: AtomicU32,
    }

    impl Translator for FlakyTranslator {
        fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(TranslateError::RateLimited)
            } else {
                Ok(request.source_content.clone())
            }
        }
    }

    /// Tracks the high-water mark of simultaneous in-flight calls.
    struct CountingTranslator {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Translator for CountingTranslator {
        fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(request.source_content.clone())
        }
    }

    fn test_config(base: &TempDir) -> RunConfig {
        let mut config = RunConfig::new(
            base.path().to_path_buf(),
            vec![LanguageTag::from("en"), LanguageTag::from("zh")],
            LanguageTag::from("en"),
        );
        config.retry_base_delay = Duration::from_millis(10);
        config.retry_max_delay = Duration::from_millis(40);
        config
    }

    fn context(translator: SharedTranslator, config: RunConfig) -> ExecutionContext {
        ExecutionContext {
            config: Arc::new(config),
            translator,
            ledger: Arc::new(Mutex::new(LedgerFile::empty())),
            cancel: CancelSignal::new(),
        }
    }

    fn create_action(rel: &str, source: &str) -> Action {
        Action {
            rel_path: PathBuf::from(rel),
            language: LanguageTag::from("zh"),
            kind: ActionKind::Create,
            source_content: source.to_string(),
            prior_target: None,
        }
    }

    fn skip_action(rel: &str) -> Action {
        Action {
            rel_path: PathBuf::from(rel),
            language: LanguageTag::from("zh"),
            kind: ActionKind::Skip,
            source_content: String::new(),
            prior_target: None,
        }
    }

    #[tokio::test]
    async fn done_action_writes_document_and_ledger_record() {
        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(EchoTranslator), test_config(&base));
        let plan = SyncPlan {
            actions: vec![create_action("guide.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Done);
        assert_eq!(outcomes[0].attempts, 1);

        let written = base.path().join("zh").join("guide.md");
        assert_eq!(std::fs::read_to_string(written).unwrap(), SOURCE);

        let ledger = ledger::load(base.path()).unwrap();
        let record = ledger
            .get(&LanguageTag::from("zh"), std::path::Path::new("guide.md"))
            .expect("record created");
        assert_eq!(
            record.primary_fingerprint, record.target_fingerprint,
            "echo translation fingerprints both sides identically"
        );
    }

    #[tokio::test]
    async fn skip_actions_never_reach_the_translator() {
        struct PanicTranslator;
        impl Translator for PanicTranslator {
            fn translate(&self, _: &TranslateRequest) -> Result<String, TranslateError> {
                panic!("skip plans must not translate");
            }
        }

        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(PanicTranslator), test_config(&base));
        let plan = SyncPlan {
            actions: vec![skip_action("a.md"), skip_action("b.md")],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Done && o.attempts == 0));
    }

    #[tokio::test]
    async fn permanent_failure_is_isolated_from_other_actions() {
        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(MarkerFailTranslator), test_config(&base));
        let plan = SyncPlan {
            actions: vec![
                create_action("bad.md", "# FAIL\n\nThis one is refused by the backend.\n"),
                create_action("good.md", SOURCE),
            ],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(outcomes[0].failure_kind, Some(FailureKind::MalformedResponse));
        assert_eq!(outcomes[0].attempts, 1, "permanent failures are not retried");
        assert_eq!(outcomes[1].status, OutcomeStatus::Done);
        assert!(base.path().join("zh").join("good.md").exists());
        assert!(!base.path().join("zh").join("bad.md").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_until_success() {
        let base = TempDir::new().unwrap();
        let translator = Arc::new(FlakyTranslator {
            failures: AtomicU32::new(2),
        });
        let ctx = context(translator, test_config(&base));
        let plan = SyncPlan {
            actions: vec![create_action("flaky.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Done);
        assert_eq!(outcomes[0].attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_records_the_transient_kind() {
        struct AlwaysLimited;
        impl Translator for AlwaysLimited {
            fn translate(&self, _: &TranslateRequest) -> Result<String, TranslateError> {
                Err(TranslateError::RateLimited)
            }
        }

        let base = TempDir::new().unwrap();
        let mut config = test_config(&base);
        config.max_attempts = 2;
        let ctx = context(Arc::new(AlwaysLimited), config);
        let plan = SyncPlan {
            actions: vec![create_action("limited.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(outcomes[0].failure_kind, Some(FailureKind::RateLimited));
        assert_eq!(outcomes[0].attempts, 2);
        assert!(!base.path().join("zh").join("limited.md").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_bound_is_respected() {
        let base = TempDir::new().unwrap();
        let translator = Arc::new(CountingTranslator {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let mut config = test_config(&base);
        config.concurrency = 2;
        let ctx = context(translator.clone(), config);

        let plan = SyncPlan {
            actions: (0..5)
                .map(|i| create_action(&format!("doc{i}.md"), SOURCE))
                .collect(),
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Done));
        let max = translator.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 2, "observed {max} concurrent translator calls");
    }

    #[tokio::test]
    async fn cancellation_stops_dispatch_without_writes() {
        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(EchoTranslator), test_config(&base));
        ctx.cancel.cancel();

        let plan = SyncPlan {
            actions: vec![create_action("a.md", SOURCE), create_action("b.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert!(outcomes
            .iter()
            .all(|o| o.failure_kind == Some(FailureKind::Cancelled)));
        assert!(!base.path().join("zh").exists(), "no writes after cancel");
    }

    #[tokio::test]
    async fn structurally_broken_generation_is_rejected_unwritten() {
        struct MangleTranslator;
        impl Translator for MangleTranslator {
            fn translate(&self, _: &TranslateRequest) -> Result<String, TranslateError> {
                Ok("tiny".to_string())
            }
        }

        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(MangleTranslator), test_config(&base));
        let plan = SyncPlan {
            actions: vec![create_action("doc.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(
            outcomes[0].failure_kind,
            Some(FailureKind::MalformedResponse)
        );
        assert!(!base.path().join("zh").join("doc.md").exists());
    }

    #[tokio::test]
    async fn reasoning_tags_are_stripped_before_writing() {
        struct ThinkingTranslator;
        impl Translator for ThinkingTranslator {
            fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
                Ok(format!(
                    "<think>considering terminology</think>\n\n{}",
                    request.source_content
                ))
            }
        }

        let base = TempDir::new().unwrap();
        let ctx = context(Arc::new(ThinkingTranslator), test_config(&base));
        let plan = SyncPlan {
            actions: vec![create_action("doc.md", SOURCE)],
        };

        let outcomes = execute_plan(&plan, &ctx).await;
        assert_eq!(outcomes[0].status, OutcomeStatus::Done);
        let written = std::fs::read_to_string(base.path().join("zh").join("doc.md")).unwrap();
        assert_eq!(written, SOURCE);
    }
}
