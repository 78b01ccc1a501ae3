//! Error types for polydoc-core.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or unusable run configuration. Always fatal — raised before any
/// tree is scanned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no languages configured; pass at least the primary language")]
    NoLanguages,

    #[error("primary language '{0}' is not in the configured language set")]
    PrimaryNotInLanguages(String),

    #[error("duplicate language tag '{0}'")]
    DuplicateLanguage(String),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("max attempts must be at least 1")]
    ZeroAttempts,

    /// Underlying I/O failure reading an optional config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on the config file — includes path context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
