//! Run configuration.
//!
//! A [`RunConfig`] is assembled by the presentation layer (CLI flags over
//! optional file defaults) and validated once before scanning. Defaults for
//! tuning knobs can be persisted in `<base>/.polydoc/config.yaml`; an absent
//! file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::LanguageTag;

/// How document content is fingerprinted before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintPolicy {
    /// Normalize CRLF to LF before hashing. The default.
    #[default]
    NormalizeEol,
    /// Hash the bytes exactly as read.
    Exact,
}

/// Validated configuration for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory containing one subdirectory per language.
    pub base_dir: PathBuf,
    /// Languages to reconcile, primary included. Order is part of the
    /// plan's deterministic ordering.
    pub languages: Vec<LanguageTag>,
    pub primary: LanguageTag,
    /// Upper bound on in-flight translator calls.
    pub concurrency: usize,
    /// Total translator attempts per action, first try included.
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub fingerprint: FingerprintPolicy,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(base_dir: PathBuf, languages: Vec<LanguageTag>, primary: LanguageTag) -> Self {
        Self {
            base_dir,
            languages,
            primary,
            concurrency: 4,
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
            fingerprint: FingerprintPolicy::default(),
            dry_run: false,
        }
    }

    /// Check invariants the engine relies on. Called once, up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::NoLanguages);
        }
        if !self.languages.contains(&self.primary) {
            return Err(ConfigError::PrimaryNotInLanguages(self.primary.0.clone()));
        }
        for (i, lang) in self.languages.iter().enumerate() {
            if self.languages[..i].contains(lang) {
                return Err(ConfigError::DuplicateLanguage(lang.0.clone()));
            }
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Languages to reconcile against the primary, in configured order.
    pub fn target_languages(&self) -> impl Iterator<Item = &LanguageTag> {
        self.languages.iter().filter(move |l| **l != self.primary)
    }

    /// Root directory of one language tree.
    pub fn language_root(&self, language: &LanguageTag) -> PathBuf {
        self.base_dir.join(&language.0)
    }

    /// Absolute path of a target document.
    pub fn document_path(&self, language: &LanguageTag, rel_path: &Path) -> PathBuf {
        self.language_root(language).join(rel_path)
    }

    /// Apply file-level defaults for any knob the caller left at its
    /// built-in default.
    pub fn apply_file_defaults(&mut self, file: &FileConfig) {
        if let Some(concurrency) = file.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(attempts) = file.max_attempts {
            self.max_attempts = attempts;
        }
        if let Some(ms) = file.retry_base_delay_ms {
            self.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.retry_max_delay_ms {
            self.retry_max_delay = Duration::from_millis(ms);
        }
        if let Some(policy) = file.fingerprint {
            self.fingerprint = policy;
        }
    }
}

/// Optional persisted defaults, loaded from `<base>/.polydoc/config.yaml`.
///
/// Every field is optional; CLI flags take precedence over these, which
/// take precedence over built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_base_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_max_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<FingerprintPolicy>,
}

/// `<base>/.polydoc/config.yaml` — pure, no I/O.
pub fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join(".polydoc").join("config.yaml")
}

/// Load the optional config file. Returns defaults when the file does not
/// exist; malformed YAML is a hard error with path context.
pub fn load_file_config(base_dir: &Path) -> Result<FileConfig, ConfigError> {
    let path = config_path(base_dir);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}
