//! Storage module for persisting crawl state
//!
//! This module handles everything the crawler writes to disk:
//! - The crawl ledger (pending / scraped / failed URL sets) and its JSON backend
//! - The append-only status log of per-URL outcomes
//! - The output record file

mod json;
mod ledger;
mod records;
mod status_log;
mod traits;

pub use json::JsonLedgerStore;
pub use ledger::{CrawlLedger, LedgerCounts, LedgerSnapshot, LedgerWriter};
pub use records::{OutputFileInfo, RecordFile};
pub use status_log::{average_success_secs, LogEntry, StatusLog};
pub use traits::{LedgerStore, StorageError, StorageResult};

use crate::config::OutputConfig;
use std::sync::{Arc, Mutex};

/// The three output artifacts of a crawl, resolved from configuration
#[derive(Clone)]
pub struct OutputFiles {
    pub ledger: Arc<dyn LedgerStore>,
    pub log: StatusLog,
    pub records: RecordFile,
}

impl OutputFiles {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            ledger: Arc::new(JsonLedgerStore::new(config.ledger_path())),
            log: StatusLog::new(config.log_path()),
            records: RecordFile::new(config.records_path()),
        }
    }

    /// Removes the status log and record file of a previous run
    ///
    /// The ledger is reset separately by [`LedgerWriter::open`].
    pub fn clear_run_artifacts(&self) -> StorageResult<()> {
        self.log.clear()?;
        self.records.clear()
    }
}

/// Ledger store held in memory
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    snapshot: Mutex<Option<LedgerSnapshot>>,
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> CrawlLedger {
        let snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot
            .clone()
            .map(CrawlLedger::from_snapshot)
            .unwrap_or_default()
    }

    fn save(&self, ledger: &CrawlLedger) -> StorageResult<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(ledger.snapshot());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
