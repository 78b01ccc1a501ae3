//! `polydoc check` — classification and plan visibility.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use polydoc_core::{ComparisonStatus, RunReport};
use polydoc_engine::{runner, CancelSignal, RunOutcome};

use crate::commands::sync::NullTranslator;
use crate::TreeArgs;

/// Arguments for `polydoc check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let mut config = self.tree.to_config()?;
        // check is a pure preview: force dry-run so nothing executes.
        config.dry_run = true;

        let outcome = runner::run_blocking(
            &config,
            std::sync::Arc::new(NullTranslator),
            CancelSignal::new(),
        )
        .context("check failed")?;

        if self.json {
            print_json(&outcome)?;
            return Ok(());
        }
        print_table(&outcome);
        Ok(())
    }
}

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "DOCUMENT")]
    document: String,
    #[tabled(rename = "LANG")]
    language: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "REASON")]
    reason: String,
}

fn print_table(outcome: &RunOutcome) {
    let rows: Vec<DocumentRow> = outcome
        .results
        .iter()
        .map(|r| DocumentRow {
            document: r.rel_path.display().to_string(),
            language: r.language.0.clone(),
            status: colorize_status(r.status),
            reason: r.reason.clone(),
        })
        .collect();

    if rows.is_empty() {
        println!("No documents found under the primary tree.");
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{}", summary_line(&outcome.report));
}

fn colorize_status(status: ComparisonStatus) -> String {
    match status {
        ComparisonStatus::Missing => status.to_string().red().to_string(),
        ComparisonStatus::Stale => status.to_string().yellow().to_string(),
        ComparisonStatus::InSync => status.to_string().green().to_string(),
    }
}

fn summary_line(report: &RunReport) -> String {
    format!(
        "{} missing, {} stale, {} in sync — {} action(s) would run",
        report.missing,
        report.stale,
        report.in_sync,
        report.missing + report.stale,
    )
}

#[derive(Serialize)]
struct CheckReportJson<'a> {
    generated_at: chrono::DateTime<Utc>,
    summary: &'a RunReport,
    documents: &'a [polydoc_core::ComparisonResult],
}

fn print_json(outcome: &RunOutcome) -> Result<()> {
    let payload = CheckReportJson {
        generated_at: Utc::now(),
        summary: &outcome.report,
        documents: &outcome.results,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
