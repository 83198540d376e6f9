//! Output record file: one JSON array of extracted restaurant records

use crate::extract::RestaurantRecord;
use crate::storage::json::{remove_if_exists, write_json_atomic};
use crate::storage::traits::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about the record file for the status interface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFileInfo {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub record_count: usize,
    pub modified: Option<DateTime<Utc>>,
}

/// JSON array of records, keyed by detail URL
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every record; a missing or corrupt file reads as empty
    pub fn load_all(&self) -> Vec<RestaurantRecord> {
        match self.read() {
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                tracing::warn!("Record file {} is unreadable ({})", self.path.display(), e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Adds a record, replacing any earlier record for the same URL
    ///
    /// A corrupt file is renamed to `<name>.corrupt-<timestamp>` before a new
    /// one is started, so its content is never overwritten.
    pub fn upsert(&self, record: &RestaurantRecord) -> StorageResult<()> {
        let mut records = match self.read() {
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                let aside = self.move_aside()?;
                tracing::warn!(
                    "Record file {} is unreadable ({}); moved it to {} and started a new one",
                    self.path.display(),
                    e,
                    aside.display()
                );
                Vec::new()
            }
            None => Vec::new(),
        };
        match records.iter_mut().find(|r| r.url == record.url) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        write_json_atomic(&self.path, &records)
    }

    pub fn clear(&self) -> StorageResult<()> {
        remove_if_exists(&self.path)
    }

    /// None when there is no readable file yet
    fn read(&self) -> Option<Result<Vec<RestaurantRecord>, serde_json::Error>> {
        let content = fs::read_to_string(&self.path).ok()?;
        Some(serde_json::from_str(&content))
    }

    fn move_aside(&self) -> StorageResult<PathBuf> {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let aside = PathBuf::from(name);

        fs::rename(&self.path, &aside).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(aside)
    }

    /// Describes the file, or None when no output exists yet
    pub fn info(&self) -> Option<OutputFileInfo> {
        let metadata = fs::metadata(&self.path).ok()?;
        Some(OutputFileInfo {
            file_name: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: self.path.clone(),
            size_bytes: metadata.len(),
            record_count: self.load_all().len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
