//! HTTP-backed rendering session
//!
//! Pages are fetched with reqwest and kept as raw HTML. `click` follows the
//! `href` of the matched element, so the session can walk pagination and
//! sub-page links the same way a browser would.

use crate::config::{Config, UserAgentConfig};
use crate::render::{Document, RateLimitGuard, RenderError, RenderResult, Renderer};
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builds an HTTP client with the crawler's identity and page timeout
///
/// The user agent has the form `CrawlerName/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(
    config: &UserAgentConfig,
    page_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(page_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A rendering session over plain HTTP
pub struct HttpRenderer {
    client: Client,
    guard: Arc<RateLimitGuard>,
    current: Option<Document>,
    closed: bool,
}

impl HttpRenderer {
    pub fn new(client: Client, guard: Arc<RateLimitGuard>) -> Self {
        Self {
            client,
            guard,
            current: None,
            closed: false,
        }
    }

    /// Starts a session configured from `config`
    pub fn launch(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent, config.crawler.page_timeout())
            .map_err(|e| CrawlError::Setup(e.to_string()))?;
        let guard = Arc::new(RateLimitGuard::from_config(&config.rate_limit));
        Ok(Self::new(client, guard))
    }

    pub fn guard(&self) -> &Arc<RateLimitGuard> {
        &self.guard
    }

    fn ensure_open(&self) -> RenderResult<()> {
        if self.closed {
            Err(RenderError::Closed)
        } else {
            Ok(())
        }
    }

    async fn fetch(&self, url: &Url) -> RenderResult<Document> {
        let client = &self.client;
        let response = self
            .guard
            .execute(url.as_str(), move || async move {
                client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|e| classify_request_error(url.as_str(), e))
            })
            .await?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(RenderError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.contains("html") {
                return Err(RenderError::ContentMismatch {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url.as_str(), e))?;

        debug!("Loaded {} ({} bytes)", final_url, body.len());
        Ok(Document::new(final_url, body))
    }
}

fn classify_request_error(url: &str, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        RenderError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        RenderError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn open(&mut self, url: &str) -> RenderResult<()> {
        self.ensure_open()?;
        let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl(format!("{url}: {e}")))?;
        let document = self.fetch(&parsed).await?;
        self.current = Some(document);
        Ok(())
    }

    fn current_document(&self) -> RenderResult<Document> {
        self.ensure_open()?;
        self.current.clone().ok_or(RenderError::NoDocument)
    }

    async fn click(&mut self, selector: &str) -> RenderResult<()> {
        let document = self.current_document()?;
        let target = document
            .link_target(selector)?
            .ok_or_else(|| RenderError::ElementNotFound {
                selector: selector.to_string(),
                url: document.url().to_string(),
            })?;

        let next = self.fetch(&target).await?;
        self.current = Some(next);
        Ok(())
    }

    /// A fetched page does not change after loading, so readiness is decided
    /// from the loaded document without polling.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> RenderResult<()> {
        let document = self.current_document()?;
        if document.has_match(selector)? {
            Ok(())
        } else {
            Err(RenderError::WaitTimeout {
                selector: selector.to_string(),
                url: document.url().to_string(),
                waited_ms: timeout.as_millis(),
            })
        }
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}
