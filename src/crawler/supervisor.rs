//! Detail Fetch Supervisor: drains the pending set up to the run's target

use crate::crawler::DetailScraper;
use crate::extract::RestaurantRecord;
use crate::render::{BackoffWindow, Renderer};
use crate::state::{FetchOutcome, StopSignal};
use crate::storage::{LedgerWriter, OutputFiles};
use crate::CrawlError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// What one fetch pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub attempted: usize,
    pub scraped: usize,
    pub failed: usize,

    /// Whole-fetch retries after rate limiting outlasted the request retries
    pub crawl_retries: u32,

    /// True when a stop request ended the pass
    pub stopped: bool,
}

/// Visits pending URLs in ledger order and records each outcome
///
/// Every attempted URL ends in exactly one ledger transition and one status
/// log line. Errors and panics inside a single fetch never escape it.
pub struct DetailFetchSupervisor<'a> {
    scraper: DetailScraper<'a>,
    files: &'a OutputFiles,
    stop: StopSignal,
    retry_window: BackoffWindow,
    max_crawl_retries: u32,
}

impl<'a> DetailFetchSupervisor<'a> {
    pub fn new(scraper: DetailScraper<'a>, files: &'a OutputFiles, stop: StopSignal) -> Self {
        Self {
            scraper,
            files,
            stop,
            retry_window: BackoffWindow::Fixed(Duration::from_secs(60)),
            max_crawl_retries: 1,
        }
    }

    /// Retries a fetch that ended rate limited, waiting `window` in between
    pub fn crawl_retries(mut self, window: BackoffWindow, max_retries: u32) -> Self {
        self.retry_window = window;
        self.max_crawl_retries = max_retries;
        self
    }

    /// Fetches until `target_count` records were scraped in this pass, the
    /// pending set is exhausted or a stop is requested
    ///
    /// Only persistence errors end the pass early with an error.
    pub async fn run(
        &self,
        renderer: &mut dyn Renderer,
        ledger: &mut LedgerWriter,
        target_count: usize,
    ) -> Result<FetchReport, CrawlError> {
        let mut report = FetchReport::default();
        let queue: Vec<String> = ledger.ledger().pending().to_vec();
        info!(
            "Fetching up to {} of {} pending detail pages",
            target_count,
            queue.len()
        );

        for url in queue {
            if self.stop.is_stopped() {
                info!(
                    "Stop requested, leaving {} URLs pending",
                    ledger.ledger().pending().len()
                );
                report.stopped = true;
                break;
            }
            if report.scraped >= target_count {
                break;
            }

            report.attempted += 1;
            let started = Instant::now();
            let result = self.fetch_with_retry(renderer, &url, &mut report).await;
            let elapsed = started.elapsed();

            match result {
                Ok(record) => {
                    self.files.records.upsert(&record)?;
                    ledger.mark_scraped(&url)?;
                    self.files.log.append(&FetchOutcome::success(&url, elapsed))?;
                    report.scraped += 1;
                    info!(
                        "Scraped {} in {:.2}s ({}/{})",
                        url,
                        elapsed.as_secs_f64(),
                        report.scraped,
                        target_count
                    );
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(
                        "Failed {} after {:.2}s: {}",
                        url,
                        elapsed.as_secs_f64(),
                        message
                    );
                    ledger.mark_failed(&url)?;
                    self.files
                        .log
                        .append(&FetchOutcome::failure(&url, message, elapsed))?;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn fetch_with_retry(
        &self,
        renderer: &mut dyn Renderer,
        url: &str,
        report: &mut FetchReport,
    ) -> Result<RestaurantRecord, CrawlError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(renderer, url).await {
                Err(CrawlError::Render(e))
                    if e.is_rate_limited() && attempt < self.max_crawl_retries =>
                {
                    attempt += 1;
                    report.crawl_retries += 1;
                    let wait = self.retry_window.sample();
                    warn!(
                        "{} is still rate limited, retrying in {:.0}s ({}/{})",
                        url,
                        wait.as_secs_f64(),
                        attempt,
                        self.max_crawl_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                result => return result,
            }
        }
    }

    /// One fetch, with panics turned into errors
    async fn fetch_once(
        &self,
        renderer: &mut dyn Renderer,
        url: &str,
    ) -> Result<RestaurantRecord, CrawlError> {
        AssertUnwindSafe(self.scraper.scrape(renderer, url))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(CrawlError::TaskAborted(panic_message(panic.as_ref())))
            })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with no message".to_string()
    }
}
