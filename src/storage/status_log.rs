//! Append-only status log with one line per detail fetch outcome

use crate::state::FetchOutcome;
use crate::storage::json::remove_if_exists;
use crate::storage::traits::{StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A parsed status log line
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub success: bool,
    pub url: String,
    pub seconds: f64,
    pub timestamp: String,
    pub error: Option<String>,
}

impl LogEntry {
    /// Parses a `SUCCESS:` or `FAILED:` line; returns None for anything else
    pub fn parse(line: &str) -> Option<Self> {
        let (success, rest) = if let Some(rest) = line.strip_prefix("SUCCESS:") {
            (true, rest)
        } else if let Some(rest) = line.strip_prefix("FAILED:") {
            (false, rest)
        } else {
            return None;
        };

        // the error message is last and may itself contain " | "
        let mut parts = rest.splitn(4, " | ");
        let url = parts.next()?.trim().to_string();
        let seconds = parts
            .next()?
            .trim()
            .strip_prefix("Time:")?
            .trim()
            .strip_suffix('s')?
            .parse()
            .ok()?;
        let timestamp = parts.next()?.trim().to_string();
        let error = parts
            .next()
            .and_then(|e| e.trim().strip_prefix("Error:"))
            .map(|e| e.trim().to_string());

        Some(Self {
            success,
            url,
            seconds,
            timestamp,
            error,
        })
    }
}

/// The durable status log file
#[derive(Debug, Clone)]
pub struct StatusLog {
    path: PathBuf,
}

impl StatusLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one outcome line
    pub fn append(&self, outcome: &FetchOutcome) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        writeln!(file, "{}", outcome.to_log_line()).map_err(|e| StorageError::io(&self.path, e))
    }

    /// Returns up to the last `n` lines, oldest first
    ///
    /// A missing or unreadable log reads as empty.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }

    /// Parsed entries of the last `n` lines
    pub fn recent_entries(&self, n: usize) -> Vec<LogEntry> {
        self.tail(n)
            .iter()
            .filter_map(|line| LogEntry::parse(line))
            .collect()
    }

    pub fn clear(&self) -> StorageResult<()> {
        remove_if_exists(&self.path)
    }
}

/// Mean duration of the successful entries, if there are any
pub fn average_success_secs(entries: &[LogEntry]) -> Option<f64> {
    let times: Vec<f64> = entries
        .iter()
        .filter(|e| e.success)
        .map(|e| e.seconds)
        .collect();

    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<f64>() / times.len() as f64)
    }
}
