//! Polydoc — multi-language documentation tree reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! polydoc check --path ./docs --langs en,zh,es --primary en [--json]
//! polydoc sync  --path ./docs --langs en,zh,es --primary en \
//!               [--dry-run] [--split] [--concurrency N] [--max-attempts N] \
//!               [--translator-url URL] [--timeout-secs N] [--byte-exact]
//! ```
//!
//! Exit codes: 0 clean run; 1 fatal error before a plan existed; 2 plan
//! computed but at least one action failed.

mod commands;
mod http_translator;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use polydoc_core::{config as core_config, FingerprintPolicy, LanguageTag, RunConfig};

use commands::{check::CheckArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "polydoc",
    version,
    about = "Reconcile per-language documentation trees against a primary language",
    long_about = None,
)]
struct Cli {
    /// Verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan, classify, and show the plan without writing anything.
    Check(CheckArgs),

    /// Execute the plan: create missing and refresh stale translations.
    Sync(SyncArgs),
}

// ---------------------------------------------------------------------------
// Shared tree arguments
// ---------------------------------------------------------------------------

/// Arguments every command needs to locate and fingerprint the trees.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Base directory containing one subdirectory per language.
    #[arg(long, short = 'p', default_value = ".")]
    pub path: PathBuf,

    /// Comma-separated language tags to reconcile (e.g. en,zh,es).
    #[arg(long, short = 'l', value_delimiter = ',', required = true)]
    pub langs: Vec<String>,

    /// The canonical language the others are compared against.
    #[arg(long, short = 'm', default_value = "en")]
    pub primary: String,

    /// Fingerprint content bytes exactly instead of normalizing line endings.
    #[arg(long)]
    pub byte_exact: bool,
}

impl TreeArgs {
    /// Assemble and validate a [`RunConfig`]: built-in defaults, then
    /// `.polydoc/config.yaml`, then explicit flags.
    pub fn to_config(&self) -> Result<RunConfig> {
        if !self.path.is_dir() {
            bail!("base directory not found: {}", self.path.display());
        }

        let languages: Vec<LanguageTag> = self
            .langs
            .iter()
            .map(|l| LanguageTag::from(l.trim()))
            .collect();
        let mut config = RunConfig::new(
            self.path.clone(),
            languages,
            LanguageTag::from(self.primary.as_str()),
        );

        let file = core_config::load_file_config(&self.path)?;
        config.apply_file_defaults(&file);

        if self.byte_exact {
            config.fingerprint = FingerprintPolicy::Exact;
        }

        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    polydoc_engine::init_tracing(cli.verbose);
    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Sync(args) => args.run(),
    }
}
