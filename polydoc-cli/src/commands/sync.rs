//! `polydoc sync` — execute the reconciliation plan.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use polydoc_core::{ActionKind, OutcomeStatus, RunReport};
use polydoc_engine::{
    runner, topology, CancelSignal, SharedTranslator, TranslateError, TranslateRequest,
    Translator,
};

use crate::http_translator::HttpTranslator;
use crate::TreeArgs;

/// Environment fallback for `--translator-url`.
pub const TRANSLATOR_URL_ENV: &str = "POLYDOC_TRANSLATOR_URL";

/// Arguments for `polydoc sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Show the plan without translating or writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Run the checker and translator halves as separate tasks joined by a
    /// serialized plan channel.
    #[arg(long)]
    pub split: bool,

    /// Upper bound on in-flight translator calls.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Total translator attempts per action, first try included.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Translation backend endpoint (defaults to $POLYDOC_TRANSLATOR_URL).
    #[arg(long)]
    pub translator_url: Option<String>,

    /// Abort the run after this many seconds; completed work is kept.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config = self.tree.to_config()?;
        config.dry_run = self.dry_run;
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        config.validate()?;

        let translator = self.build_translator()?;
        let cancel = CancelSignal::new();
        if let Some(secs) = self.timeout_secs {
            let deadline = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(secs));
                deadline.cancel();
            });
        }

        let outcome = if self.split {
            topology::run_split_blocking(&config, translator, cancel)
        } else {
            runner::run_blocking(&config, translator, cancel)
        }
        .context("sync failed before a plan existed")?;

        print_report(&outcome.report, &outcome.plan, self.dry_run);

        if outcome.report.has_failures() {
            // Partial failure: the run completed and was reported, but at
            // least one action ended in error.
            std::process::exit(2);
        }
        Ok(())
    }

    fn build_translator(&self) -> Result<SharedTranslator> {
        if self.dry_run {
            return Ok(Arc::new(NullTranslator));
        }
        let url = self
            .translator_url
            .clone()
            .or_else(|| std::env::var(TRANSLATOR_URL_ENV).ok());
        let Some(url) = url else {
            bail!("no translation backend configured; pass --translator-url or set {TRANSLATOR_URL_ENV} (or use --dry-run)");
        };
        Ok(Arc::new(HttpTranslator::new(url)))
    }
}

/// Translator for paths that never generate (check, dry-run). Calling it is
/// a wiring bug.
pub struct NullTranslator;

impl Translator for NullTranslator {
    fn translate(&self, _request: &TranslateRequest) -> Result<String, TranslateError> {
        Err(TranslateError::MalformedResponse(
            "no translation backend configured".to_string(),
        ))
    }
}

fn print_report(report: &RunReport, plan: &polydoc_core::SyncPlan, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if dry_run {
        for action in &plan.actions {
            match action.kind {
                ActionKind::Create | ActionKind::Update => println!(
                    "  {}  {}/{} ({})",
                    "~".yellow(),
                    action.language,
                    action.rel_path.display(),
                    action.kind,
                ),
                ActionKind::Skip => println!(
                    "  {}  {}/{}",
                    "·".dimmed(),
                    action.language,
                    action.rel_path.display(),
                ),
            }
        }
        println!(
            "{prefix}{} missing, {} stale, {} in sync — {} action(s) would run",
            report.missing,
            report.stale,
            report.in_sync,
            report.missing + report.stale,
        );
        return;
    }

    for outcome in &report.outcomes {
        match (outcome.status, outcome.kind) {
            (OutcomeStatus::Done, ActionKind::Skip) => println!(
                "  {}  {}/{}",
                "·".dimmed(),
                outcome.language,
                outcome.rel_path.display(),
            ),
            (OutcomeStatus::Done, _) => println!(
                "  {}  {}/{} ({}, {} attempt(s))",
                "✎".green(),
                outcome.language,
                outcome.rel_path.display(),
                outcome.kind,
                outcome.attempts,
            ),
            (OutcomeStatus::Error, _) => {
                let kind = outcome
                    .failure_kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "error".to_string());
                println!(
                    "  {}  {}/{} ({kind}: {})",
                    "✗".red(),
                    outcome.language,
                    outcome.rel_path.display(),
                    outcome
                        .failure_detail
                        .as_deref()
                        .unwrap_or("unknown failure"),
                );
            }
        }
    }

    let line = format!(
        "{prefix}✓ synced ({} created, {} updated, {} skipped, {} failed)",
        report.created, report.updated, report.skipped, report.failed,
    );
    if report.has_failures() {
        println!("{}", line.yellow());
    } else {
        println!("{line}");
    }
}
