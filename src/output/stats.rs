//! Statistics display for the seen-job history

use crate::storage::{HistoryStatistics, HistoryStore, RunRecord, StorageResult};

/// History statistics plus the latest run, if any
#[derive(Debug, Clone)]
pub struct HistoryReport {
    pub statistics: HistoryStatistics,
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from the history store
pub fn load_statistics(store: &dyn HistoryStore) -> StorageResult<HistoryReport> {
    Ok(HistoryReport {
        statistics: store.statistics()?,
        latest_run: store.get_latest_run()?,
    })
}

/// Formats statistics for the terminal
pub fn format_statistics(report: &HistoryReport) -> String {
    let stats = &report.statistics;
    let mut out = String::new();

    out.push_str("=== Job History Statistics ===\n\n");

    out.push_str("Overview:\n");
    out.push_str(&format!("  Tracked jobs: {}\n", stats.tracked_jobs));
    out.push_str(&format!("  Runs: {}\n", stats.runs));
    out.push_str(&format!("  Total jobs found: {}\n", stats.total_jobs_found));
    out.push_str(&format!("  Notifications sent: {}\n", stats.notifications_sent));
    out.push_str(&format!(
        "  Last notification: {}\n",
        stats.last_notification.as_deref().unwrap_or("never")
    ));
    out.push_str(&format!(
        "  Last update: {}\n",
        stats.last_update.as_deref().unwrap_or("never")
    ));

    if let Some(run) = &report.latest_run {
        out.push_str("\nLatest Run:\n");
        out.push_str(&format!("  ID: {}\n", run.id));
        out.push_str(&format!("  Status: {}\n", run.status.to_db_string()));
        out.push_str(&format!("  Started: {}\n", run.started_at));
        if let Some(finished) = &run.finished_at {
            out.push_str(&format!("  Finished: {}\n", finished));
        }
        out.push_str(&format!(
            "  Jobs found: {} ({} new, {} matching)\n",
            run.totals.jobs_found, run.totals.new_jobs, run.totals.matches
        ));
        out.push_str(&format!(
            "  Notified: {}\n",
            if run.totals.notified { "yes" } else { "no" }
        ));
    }

    out
}

/// Prints statistics to stdout
pub fn print_statistics(report: &HistoryReport) {
    print!("{}", format_statistics(report));
}
