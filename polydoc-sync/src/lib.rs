//! # polydoc-sync
//!
//! Ledger persistence, staleness classification, plan construction, and
//! atomic document writes for the polydoc reconciliation engine.
//!
//! Call [`compare::classify_all`] against scanned trees and the loaded
//! [`ledger::LedgerFile`], feed the results through [`plan::build_plan`],
//! and fold executed outcomes into a report with [`report::build_report`].

pub mod analyzer;
pub mod compare;
pub mod error;
pub mod ledger;
pub mod plan;
pub mod report;
pub mod writer;

pub use error::SyncError;
pub use ledger::LedgerFile;
pub use plan::PlanSources;
