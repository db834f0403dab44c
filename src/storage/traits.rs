//! Storage traits and error types
//!
//! This module defines the trait interface for the seen-job history and
//! associated error types.

use crate::model::JobRecord;
use crate::storage::{HistoryStatistics, RunRecord, RunTotals};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of which jobs have already been reported
///
/// The crawl and scoring core never queries history itself; the run
/// pipeline uses this trait to drop already-seen records before scoring
/// and to remember new ones once they were reported.
pub trait HistoryStore {
    // ===== Run Management =====

    /// Creates a new run and returns its ID
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the settings file used for the run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and stores its totals
    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()>;

    /// Marks a run as failed and stores whatever totals it reached
    fn fail_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()>;

    // ===== Seen Jobs =====

    /// Whether a job URL has been recorded before
    fn is_seen(&self, url: &str) -> StorageResult<bool>;

    /// Drops records whose URL has been seen, preserving order
    fn filter_unseen(&self, records: Vec<JobRecord>) -> StorageResult<Vec<JobRecord>> {
        let mut unseen = Vec::with_capacity(records.len());
        for record in records {
            if !self.is_seen(&record.url)? {
                unseen.push(record);
            }
        }
        Ok(unseen)
    }

    /// Records jobs as seen; URLs already present are left untouched
    ///
    /// # Returns
    ///
    /// The number of URLs that were not tracked before
    fn mark_seen(&mut self, records: &[JobRecord], run_id: i64) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Aggregated history across all runs
    fn statistics(&self) -> StorageResult<HistoryStatistics>;
}
