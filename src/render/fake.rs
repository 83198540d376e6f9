//! Scripted in-memory renderer for unit tests

use crate::render::{Document, RenderError, RenderResult, Renderer};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Page(String),
    Error(RenderError),
    Panic,
}

/// Shared view of what a [`FakeRenderer`] was asked to do
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeLog {
    opened: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeLog {
    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub(crate) fn open_count(&self, url: &str) -> usize {
        self.opened().iter().filter(|u| u.as_str() == url).count()
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Serves scripted responses per URL
///
/// Each URL holds a queue of responses. The front is consumed on every open
/// while more than one remains; the last one repeats forever. Unknown URLs
/// answer HTTP 404.
#[derive(Debug, Default)]
pub(crate) struct FakeRenderer {
    responses: HashMap<String, VecDeque<FakeResponse>>,
    current: Option<Document>,
    closed: bool,
    log: FakeLog,
}

impl FakeRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.respond(url, FakeResponse::Page(html.to_string()))
    }

    pub(crate) fn respond(mut self, url: &str, response: FakeResponse) -> Self {
        self.responses
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn log(&self) -> FakeLog {
        self.log.clone()
    }

    fn next_response(&mut self, url: &str) -> Option<FakeResponse> {
        let queue = self.responses.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open(&mut self, url: &str) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.log.opened.lock().unwrap().push(url.to_string());

        match self.next_response(url) {
            Some(FakeResponse::Page(html)) => {
                let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl(e.to_string()))?;
                self.current = Some(Document::new(parsed, html));
                Ok(())
            }
            Some(FakeResponse::Error(error)) => Err(error),
            Some(FakeResponse::Panic) => panic!("scripted renderer panic at {url}"),
            None => Err(RenderError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn current_document(&self) -> RenderResult<Document> {
        if self.closed {
            return Err(RenderError::Closed);
        }
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
        self.open(target.as_str()).await
    }

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
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
