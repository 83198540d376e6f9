//! Page rendering collaborator
//!
//! The crawl core never talks to the network directly. It drives a
//! [`Renderer`], a navigable browsing session with one current page:
//! - `open` loads a URL and makes it the current page
//! - `current_document` returns the loaded page
//! - `click` follows the link under a selector
//! - `wait_for` checks that a selector is present within a time bound
//!
//! [`HttpRenderer`] is the production session. Every request it makes passes
//! through the [`RateLimitGuard`].

mod document;
mod http;
mod rate_limit;

#[cfg(test)]
pub(crate) mod fake;

pub use document::Document;
pub use http::{build_http_client, HttpRenderer};
pub use rate_limit::{BackoffWindow, HttpStatus, RateLimitGuard};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by a rendering session
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Rate limited at {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("Timed out loading {url}")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("No element matches '{selector}' on {url}")]
    ElementNotFound { selector: String, url: String },

    #[error("Element '{selector}' did not appear on {url} within {waited_ms}ms")]
    WaitTimeout {
        selector: String,
        url: String,
        waited_ms: u128,
    },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No page is open")]
    NoDocument,

    #[error("Browsing session lost: {0}")]
    SessionLost(String),

    #[error("Browsing session is closed")]
    Closed,
}

impl RenderError {
    /// Returns true for a 429 that outlasted the request-level retries
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true if the error must fail the whole record
    ///
    /// Other errors met while loading an optional sub-page only degrade the
    /// fields that sub-page would have filled.
    pub fn aborts_record(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::SessionLost(_) | Self::Closed
        )
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// A browsing session with a single current page
///
/// Implementations are driven strictly sequentially by one crawl run.
#[async_trait]
pub trait Renderer: Send {
    /// Navigates to `url` and makes it the current page
    async fn open(&mut self, url: &str) -> RenderResult<()>;

    /// Returns the current page
    fn current_document(&self) -> RenderResult<Document>;

    /// Follows the link of the first element matching `selector`
    async fn click(&mut self, selector: &str) -> RenderResult<()>;

    /// Succeeds once `selector` matches on the current page, bounded by `timeout`
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> RenderResult<()>;

    /// Ends the session; later calls fail with [`RenderError::Closed`]
    async fn close(&mut self) -> RenderResult<()>;
}

/// Builds a fresh rendering session for each crawl run
pub type SessionFactory =
    std::sync::Arc<dyn Fn() -> Result<Box<dyn Renderer>, crate::CrawlError> + Send + Sync>;
