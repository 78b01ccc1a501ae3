//! Sync ledger — persisted record of last-synced fingerprints.
//!
//! One JSON document at `<base>/.polydoc/ledger.json` holds a
//! [`SyncRecord`] per `(path, language)` pair, keyed `"lang/rel/path"`.
//! Writes use an atomic `.tmp` + rename so a crashed run never leaves a
//! torn ledger behind. Records are created or overwritten on successful
//! non-dry-run actions and never deleted by the engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use polydoc_core::{LanguageTag, SyncRecord};

use crate::error::{io_err, SyncError};

/// On-disk ledger payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerFile {
    pub updated_at: DateTime<Utc>,
    pub records: BTreeMap<String, SyncRecord>,
}

impl LedgerFile {
    pub fn empty() -> Self {
        Self {
            updated_at: Utc::now(),
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, language: &LanguageTag, rel_path: &Path) -> Option<&SyncRecord> {
        self.records.get(&record_key(language, rel_path))
    }

    /// Insert or overwrite the record for a pair.
    pub fn upsert(&mut self, language: &LanguageTag, rel_path: &Path, record: SyncRecord) {
        self.records.insert(record_key(language, rel_path), record);
        self.updated_at = Utc::now();
    }
}

/// Ledger key for a `(path, language)` pair. Path separators are
/// normalized to `/` so ledgers travel between platforms.
pub fn record_key(language: &LanguageTag, rel_path: &Path) -> String {
    let rel = rel_path.to_string_lossy().replace('\\', "/");
    format!("{}/{rel}", language.0)
}

/// `<base>/.polydoc/ledger.json` — pure, no I/O.
pub fn ledger_path(base_dir: &Path) -> PathBuf {
    base_dir.join(".polydoc").join("ledger.json")
}

/// Load the ledger for a documentation base directory.
///
/// Returns an empty ledger if the file does not yet exist.
pub fn load(base_dir: &Path) -> Result<LedgerFile, SyncError> {
    let path = ledger_path(base_dir);
    if !path.exists() {
        return Ok(LedgerFile::empty());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the ledger atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save(base_dir: &Path, ledger: &LedgerFile) -> Result<(), SyncError> {
    let path = ledger_path(base_dir);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid ledger path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(ledger)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    tracing::debug!("ledger saved: {} record(s)", ledger.records.len());
    Ok(())
}
