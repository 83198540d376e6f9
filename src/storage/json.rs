//! JSON file ledger backend

use crate::storage::ledger::{CrawlLedger, LedgerSnapshot};
use crate::storage::traits::{LedgerStore, StorageError, StorageResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Ledger persisted as a single JSON object
///
/// ```json
/// { "pending_urls": [], "scraped_urls": [], "failed_urls": [] }
/// ```
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> CrawlLedger {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No ledger at {}, starting empty", self.path.display());
                return CrawlLedger::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read ledger {}: {}; treating it as empty",
                    self.path.display(),
                    e
                );
                return CrawlLedger::new();
            }
        };

        match serde_json::from_str::<LedgerSnapshot>(&content) {
            Ok(snapshot) => CrawlLedger::from_snapshot(snapshot),
            Err(e) => {
                tracing::warn!(
                    "Ledger {} is corrupt ({}); treating it as empty",
                    self.path.display(),
                    e
                );
                CrawlLedger::new()
            }
        }
    }

    fn save(&self, ledger: &CrawlLedger) -> StorageResult<()> {
        write_json_atomic(&self.path, &ledger.snapshot())
    }

    fn clear(&self) -> StorageResult<()> {
        remove_if_exists(&self.path)
    }
}

/// Writes `value` as pretty JSON to a temp file, then renames it over `path`
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let file = File::create(&temp_path).map_err(|e| StorageError::io(&temp_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|e| StorageError::io(&temp_path, e))?;
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| StorageError::io(path, e))?;
    tracing::trace!(path = %path.display(), "Snapshot written");
    Ok(())
}

/// Deletes a file, treating a missing file as already removed
pub(crate) fn remove_if_exists(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
