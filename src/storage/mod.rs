//! Storage module for the seen-job history
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking with per-run totals
//! - Seen-job bookkeeping used to report each posting once
//! - Aggregated statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteHistory;
pub use traits::{HistoryStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the history database at `path`
pub fn open_history(path: &Path) -> StorageResult<SqliteHistory> {
    SqliteHistory::new(path)
}

/// Represents a pipeline run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub totals: RunTotals,
}

/// Counters stored with a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Records crawled across all sources
    pub jobs_found: usize,

    /// Records not seen in earlier runs
    pub new_jobs: usize,

    /// Records that passed the ranking filter
    pub matches: usize,

    /// Whether a notification was delivered
    pub notified: bool,
}

/// Aggregated view of the history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStatistics {
    /// Distinct job URLs recorded as seen
    pub tracked_jobs: u64,

    /// Number of runs ever started
    pub runs: u64,

    /// New jobs summed over runs that delivered a notification
    pub total_jobs_found: u64,

    /// Runs that delivered a notification
    pub notifications_sent: u64,

    pub last_notification: Option<String>,

    /// Finish time of the latest completed run
    pub last_update: Option<String>,
}

/// Status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
