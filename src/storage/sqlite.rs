//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the HistoryStore trait.

use crate::model::JobRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{HistoryStore, StorageError, StorageResult};
use crate::storage::{HistoryStatistics, RunRecord, RunStatus, RunTotals};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
                           jobs_found, new_jobs, matches, notified";

/// SQLite history backend
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    /// Opens or creates the database, creating missing parent directories
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, totals: &RunTotals) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs
             SET status = ?1, finished_at = ?2, jobs_found = ?3, new_jobs = ?4,
                 matches = ?5, notified = ?6
             WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                totals.jobs_found as i64,
                totals.new_jobs as i64,
                totals.matches as i64,
                totals.notified,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        totals: RunTotals {
            jobs_found: row.get::<_, i64>(5)? as usize,
            new_jobs: row.get::<_, i64>(6)? as usize,
            matches: row.get::<_, i64>(7)? as usize,
            notified: row.get(8)?,
        },
    })
}

impl HistoryStore for SqliteHistory {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, totals)
    }

    fn fail_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, totals)
    }

    // ===== Seen Jobs =====

    fn is_seen(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM seen_jobs WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_seen(&mut self, records: &[JobRecord], run_id: i64) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO seen_jobs (url, title, location, source, first_seen_at, run_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.url,
                    record.title,
                    record.location,
                    record.source,
                    record.discovered_at.to_rfc3339(),
                    run_id
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    // ===== Statistics =====

    fn statistics(&self) -> StorageResult<HistoryStatistics> {
        let tracked_jobs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_jobs", [], |row| row.get(0))?;

        let runs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;

        let (total_jobs_found, notifications_sent, last_notification): (i64, i64, Option<String>) =
            self.conn.query_row(
                "SELECT COALESCE(SUM(new_jobs), 0), COUNT(*), MAX(finished_at)
                 FROM runs WHERE notified = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let last_update: Option<String> = self.conn.query_row(
            "SELECT MAX(finished_at) FROM runs WHERE status = ?1",
            params![RunStatus::Completed.to_db_string()],
            |row| row.get(0),
        )?;

        Ok(HistoryStatistics {
            tracked_jobs: tracked_jobs as u64,
            runs: runs as u64,
            total_jobs_found: total_jobs_found as u64,
            notifications_sent: notifications_sent as u64,
            last_notification,
            last_update,
        })
    }
}
