//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::state::UrlState;
use crate::storage::CrawlLedger;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("URL is not pending: {url} (currently {state:?})")]
    NotPending {
        url: String,
        state: Option<UrlState>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for durable ledger backends
///
/// The crawl run is the only writer; the status reporter only calls `load`.
pub trait LedgerStore: Send + Sync {
    /// Reads the durable ledger
    ///
    /// Missing or unreadable state yields an empty ledger rather than an
    /// error, so a damaged file never blocks a fresh run.
    fn load(&self) -> CrawlLedger;

    /// Replaces the durable ledger with a full snapshot of `ledger`
    ///
    /// Readers observe either the previous snapshot or the new one, never a
    /// partially written file.
    fn save(&self, ledger: &CrawlLedger) -> StorageResult<()>;

    /// Removes all durable state
    fn clear(&self) -> StorageResult<()>;
}
