//! Run report aggregation.
//!
//! Pure fold over classification results and action outcomes into the
//! [`RunReport`] counters. Counting is commutative, so the completion order
//! of concurrent actions never changes the totals.

use polydoc_core::{
    ActionKind, ActionOutcome, ComparisonResult, ComparisonStatus, OutcomeStatus, RunReport,
    SyncPlan,
};

/// Aggregate a completed (or dry) run.
///
/// On dry runs `outcomes` is empty and the created/updated/failed counters
/// stay zero; the classification counters still describe what the plan
/// would do.
pub fn build_report(
    results: &[ComparisonResult],
    plan: &SyncPlan,
    outcomes: Vec<ActionOutcome>,
    dry_run: bool,
) -> RunReport {
    let mut report = RunReport {
        dry_run,
        ..RunReport::default()
    };

    for result in results {
        match result.status {
            ComparisonStatus::Missing => report.missing += 1,
            ComparisonStatus::Stale => report.stale += 1,
            ComparisonStatus::InSync => report.in_sync += 1,
        }
    }

    report.skipped = plan
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::Skip)
        .count();

    for outcome in &outcomes {
        match (outcome.status, outcome.kind) {
            (OutcomeStatus::Done, ActionKind::Create) => report.created += 1,
            (OutcomeStatus::Done, ActionKind::Update) => report.updated += 1,
            (OutcomeStatus::Done, ActionKind::Skip) => {}
            (OutcomeStatus::Error, _) => report.failed += 1,
        }
    }

    report.outcomes = outcomes;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use polydoc_core::{Action, FailureKind, LanguageTag};

    fn action(rel: &str, kind: ActionKind) -> Action {
        Action {
            rel_path: PathBuf::from(rel),
            language: LanguageTag::from("zh"),
            kind,
            source_content: String::new(),
            prior_target: None,
        }
    }

    fn result(rel: &str, status: ComparisonStatus) -> ComparisonResult {
        ComparisonResult {
            rel_path: PathBuf::from(rel),
            language: LanguageTag::from("zh"),
            status,
            reason: String::new(),
        }
    }

    #[test]
    fn counts_classifications_and_outcomes() {
        let results = vec![
            result("a.md", ComparisonStatus::Missing),
            result("b.md", ComparisonStatus::Stale),
            result("c.md", ComparisonStatus::InSync),
        ];
        let plan = SyncPlan {
            actions: vec![
                action("a.md", ActionKind::Create),
                action("b.md", ActionKind::Update),
                action("c.md", ActionKind::Skip),
            ],
        };
        let outcomes = vec![
            ActionOutcome::done(&plan.actions[0], 1),
            ActionOutcome::failed(
                &plan.actions[1],
                3,
                FailureKind::NetworkUnavailable,
                "gateway down".to_string(),
            ),
            ActionOutcome::done(&plan.actions[2], 0),
        ];

        let report = build_report(&results, &plan, outcomes, false);
        assert_eq!(report.missing, 1);
        assert_eq!(report.stale, 1);
        assert_eq!(report.in_sync, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert!(report.has_failures());
    }

    #[test]
    fn outcome_order_does_not_change_totals() {
        let plan = SyncPlan {
            actions: vec![
                action("a.md", ActionKind::Create),
                action("b.md", ActionKind::Update),
            ],
        };
        let forward = vec![
            ActionOutcome::done(&plan.actions[0], 1),
            ActionOutcome::done(&plan.actions[1], 2),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = build_report(&[], &plan, forward, false);
        let b = build_report(&[], &plan, reversed, false);
        assert_eq!((a.created, a.updated, a.failed), (b.created, b.updated, b.failed));
    }

    #[test]
    fn dry_run_reports_plan_without_execution_counts() {
        let results = vec![
            result("a.md", ComparisonStatus::Missing),
            result("b.md", ComparisonStatus::InSync),
        ];
        let plan = SyncPlan {
            actions: vec![
                action("a.md", ActionKind::Create),
                action("b.md", ActionKind::Skip),
            ],
        };

        let report = build_report(&results, &plan, Vec::new(), true);
        assert!(report.dry_run);
        assert_eq!(report.missing, 1);
        assert_eq!(report.created, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, 1);
        assert!(report.outcomes.is_empty());
    }
}
