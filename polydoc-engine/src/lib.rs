//! # polydoc-engine
//!
//! Orchestration of the reconciliation pipeline: scanning, classification,
//! plan construction, and bounded-concurrency translation dispatch with
//! retry and partial-failure isolation.
//!
//! Call [`runner::run`] (or [`runner::run_blocking`] from sync code) for
//! the single-process deployment, or [`topology::run_split`] to exercise
//! the checker/translator split. Supply the generation capability by
//! implementing [`Translator`].

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod runner;
pub mod topology;
pub mod translator;

pub use cancel::CancelSignal;
pub use error::EngineError;
pub use runner::{run, run_blocking, RunOutcome};
pub use translator::{SharedTranslator, TranslateError, TranslateRequest, Translator};

/// Initialize tracing for engine consumers.
///
/// `verbose` drops the default filter to debug; `RUST_LOG` still wins when
/// set. Logs go to stderr so stdout stays clean for machine-readable
/// output. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
