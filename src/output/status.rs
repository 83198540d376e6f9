//! Status reporting from the persisted ledger and status log
//!
//! The reporter only reads: the ledger's last saved snapshot, the tail of the
//! status log and the in-memory task status. It is safe to call while a crawl
//! is writing those files.

use crate::state::TaskStatus;
use crate::storage::{average_success_secs, LedgerCounts, LogEntry, OutputFileInfo, OutputFiles};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

/// Number of status log lines returned with a report
pub const RECENT_LINES: usize = 10;

/// Derived progress of the current or most recent crawl
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub counts: LedgerCounts,

    /// Per-run target the percentage is measured against
    pub target_count: usize,

    /// Records scraped by the current or most recent run
    ///
    /// Counted from status log lines written since that run started, so
    /// records kept from earlier resumed runs are excluded.
    pub run_scraped: usize,

    /// `run_scraped` over the target, capped at 100
    pub progress_percentage: f64,

    /// Estimated seconds left for this run's remaining records
    ///
    /// Mean success duration of this run times the records still needed,
    /// bounded by the pending count. Only while running and once this run
    /// has scraped something.
    pub eta_secs: Option<f64>,

    pub recent_log_lines: Vec<String>,
    pub output_file: Option<OutputFileInfo>,
    pub task: TaskStatus,
}

/// Computes [`StatusReport`]s over one set of output files
#[derive(Clone)]
pub struct StatusReporter {
    files: OutputFiles,
    default_target: usize,
}

impl StatusReporter {
    /// # Arguments
    ///
    /// * `files` - Output files of the crawl being observed
    /// * `default_target` - Target used when no run has been started yet
    pub fn new(files: OutputFiles, default_target: usize) -> Self {
        Self {
            files,
            default_target,
        }
    }

    pub fn report(&self, task: &TaskStatus) -> StatusReport {
        let counts = self.files.ledger.load().counts();
        let target_count = task
            .current_params
            .as_ref()
            .or(task.last_params.as_ref())
            .map(|p| p.target_count)
            .unwrap_or(self.default_target);

        let run_entries = self.run_entries(task);
        let run_scraped = run_entries.iter().filter(|e| e.success).count();
        let remaining = target_count.saturating_sub(run_scraped).min(counts.pending);

        let eta_secs = if task.is_running {
            average_success_secs(&run_entries).map(|avg| avg * remaining as f64)
        } else {
            None
        };

        StatusReport {
            counts,
            target_count,
            run_scraped,
            progress_percentage: progress_percentage(run_scraped, target_count),
            eta_secs,
            recent_log_lines: self.files.log.tail(RECENT_LINES),
            output_file: self.files.records.info(),
            task: task.clone(),
        }
    }

    /// Status log entries written since the most recent run started
    fn run_entries(&self, task: &TaskStatus) -> Vec<LogEntry> {
        let Some(started) = task.last_start_time else {
            return Vec::new();
        };
        // log timestamps carry whole seconds
        let since = started.trunc_subsecs(0);

        self.files
            .log
            .recent_entries(usize::MAX)
            .into_iter()
            .filter(|entry| {
                DateTime::parse_from_rfc3339(&entry.timestamp)
                    .map(|at| at.with_timezone(&Utc) >= since)
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// `scraped / target` as a percentage, capped at 100
///
/// A zero target has nothing left to do and reads as complete.
pub fn progress_percentage(scraped: usize, target: usize) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (scraped as f64 / target as f64 * 100.0).min(100.0)
}

/// Prints a report to stdout in a formatted manner
pub fn print_status(report: &StatusReport) {
    println!("=== Crawl Status ===\n");

    let state = if report.task.is_running {
        if report.task.stop_requested {
            "stopping"
        } else {
            "running"
        }
    } else {
        "idle"
    };
    println!("Task: {}", state);
    if let Some(started) = report.task.start_time {
        println!("  Started: {}", started.to_rfc3339());
    }
    if let Some(params) = report.task.current_params.as_ref().or(report.task.last_params.as_ref()) {
        println!("  Base URL: {}", params.base_url);
        println!("  Resume: {}", params.resume);
    }
    if let Some(error) = &report.task.last_error {
        println!("  Last error: {}", error);
    }
    println!();

    println!("Ledger:");
    println!("  Scraped: {}", report.counts.scraped);
    println!("  Failed: {}", report.counts.failed);
    println!("  Pending: {}", report.counts.pending);
    println!("  Total: {}", report.counts.total);
    println!(
        "  Progress: {:.1}% ({} of {} this run)",
        report.progress_percentage, report.run_scraped, report.target_count
    );
    match report.eta_secs {
        Some(eta) => println!("  ETA: {:.0}s", eta),
        None => println!("  ETA: n/a"),
    }
    println!();

    match &report.output_file {
        Some(info) => {
            println!("Output: {}", info.path.display());
            println!("  Records: {}", info.record_count);
            println!("  Size: {} bytes", info.size_bytes);
        }
        None => println!("Output: none yet"),
    }

    if !report.recent_log_lines.is_empty() {
        println!("\nRecent outcomes:");
        for line in &report.recent_log_lines {
            println!("  {}", line);
        }
    }
}
