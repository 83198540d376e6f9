//! rst-crawler: a resumable restaurant listing crawler
//!
//! This crate walks a paginated restaurant listing, collects detail-page links
//! into a durable ledger, visits each detail page to extract a structured record,
//! and reports progress while a crawl runs in the background.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod render;
pub mod service;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Failed to start browsing session: {0}")]
    Setup(String),

    #[error("Crawl run exceeded its time limit of {limit_secs}s")]
    RunTimeout { limit_secs: u64 },

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("Crawl task aborted: {0}")]
    TaskAborted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{name}': {selector}")]
    InvalidSelector { name: String, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, RunSummary};
pub use service::{CrawlService, StartRequest, StartResponse};
pub use state::{FetchOutcome, RunParams, UrlState};
pub use storage::CrawlLedger;
