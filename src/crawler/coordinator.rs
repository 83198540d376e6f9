//! Crawler coordinator - run-level orchestration
//!
//! This module ties one crawl run together:
//! - Resetting or resuming the ledger and output files
//! - Running discovery, then detail fetching, over one rendering session
//! - Enforcing the overall run time limit
//! - Closing the session however the run ends

use crate::config::Config;
use crate::crawler::{DetailFetchSupervisor, DetailScraper, DiscoveryReport, DiscoveryWalker, FetchReport};
use crate::extract::{SectionRegistry, SelectorMap};
use crate::render::{BackoffWindow, HttpRenderer, Renderer};
use crate::state::{RunParams, StopSignal};
use crate::storage::{LedgerCounts, LedgerWriter, OutputFiles};
use crate::CrawlError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub discovery: DiscoveryReport,
    pub fetch: FetchReport,
    pub counts: LedgerCounts,
    pub elapsed: Duration,
}

/// Main crawl coordinator
pub struct Coordinator {
    config: Arc<Config>,
    params: RunParams,
    selectors: SelectorMap,
    registry: SectionRegistry,
    files: OutputFiles,
    stop: StopSignal,
    retry_failed: bool,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `params` - Base URL, target and resume flag of this run
    /// * `stop` - Cooperative stop flag observed between detail fetches
    pub fn new(config: Arc<Config>, params: RunParams, stop: StopSignal) -> Result<Self, CrawlError> {
        let selectors = SelectorMap::with_overrides(&config.selectors)?;
        let files = OutputFiles::from_config(&config.output);

        Ok(Self {
            config,
            params,
            selectors,
            registry: SectionRegistry::default(),
            files,
            stop,
            retry_failed: false,
        })
    }

    /// Uses these output files instead of the configured ones
    pub fn with_files(mut self, files: OutputFiles) -> Self {
        self.files = files;
        self
    }

    /// Moves failed URLs back to pending when the run resumes
    pub fn retry_failed(mut self, retry: bool) -> Self {
        self.retry_failed = retry;
        self
    }

    pub fn files(&self) -> &OutputFiles {
        &self.files
    }

    /// Listing seeds in walk order: the run's base URL, then configured extras
    fn seeds(&self) -> Vec<String> {
        let mut seeds = vec![self.params.base_url.clone()];
        for seed in &self.config.crawler.extra_seeds {
            if !seeds.contains(seed) {
                seeds.push(seed.clone());
            }
        }
        seeds
    }

    /// Runs the crawl on `session`, then closes it
    ///
    /// The session is closed on every path, including errors and the run
    /// time limit.
    pub async fn execute(&self, mut session: Box<dyn Renderer>) -> Result<RunSummary, CrawlError> {
        let result = match self.config.crawler.run_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.run(session.as_mut())).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        "Crawl exceeded {}s, abandoning the run; progress so far is saved",
                        limit.as_secs()
                    );
                    Err(CrawlError::RunTimeout {
                        limit_secs: limit.as_secs(),
                    })
                }
            },
            None => self.run(session.as_mut()).await,
        };

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close the browsing session: {}", e);
        }
        result
    }

    /// Runs discovery and detail fetching
    ///
    /// A fresh run clears the ledger, status log and record file before any
    /// discovery happens.
    pub async fn run(&self, renderer: &mut dyn Renderer) -> Result<RunSummary, CrawlError> {
        let started = Instant::now();
        let crawler = &self.config.crawler;
        tracing::info!(
            "Starting crawl of {} (target {}, {})",
            self.params.base_url,
            self.params.target_count,
            if self.params.resume { "resuming" } else { "fresh" }
        );

        if !self.params.resume {
            self.files.clear_run_artifacts()?;
        }
        let mut ledger = LedgerWriter::open(self.files.ledger.clone(), self.params.resume)?;
        if self.retry_failed {
            let moved = ledger.requeue_failed()?;
            tracing::info!("Requeued {} failed URLs", moved);
        }

        let discovery = DiscoveryWalker::new(&self.selectors)
            .allowed_domains(&crawler.allowed_domains)
            .policy(crawler.discovery_policy, self.params.target_count)
            .max_pages(crawler.max_listing_pages)
            .walk(renderer, &mut ledger, &self.seeds())
            .await?;
        tracing::info!(
            "Discovery finished: {} listing pages, {} new URLs, {} pending",
            discovery.pages_visited,
            discovery.newly_added,
            ledger.ledger().pending().len()
        );

        let scraper = DetailScraper::new(&self.selectors, &self.registry, crawler.ready_timeout());
        let fetch = DetailFetchSupervisor::new(scraper, &self.files, self.stop.clone())
            .crawl_retries(
                BackoffWindow::Fixed(Duration::from_millis(
                    self.config.rate_limit.crawl_retry_wait_ms,
                )),
                self.config.rate_limit.crawl_retries,
            )
            .run(renderer, &mut ledger, self.params.target_count)
            .await?;

        let counts = ledger.ledger().counts();
        let elapsed = started.elapsed();
        tracing::info!(
            "Crawl finished in {:.1}s: {} scraped, {} failed this run; ledger has {} pending, {} scraped, {} failed",
            elapsed.as_secs_f64(),
            fetch.scraped,
            fetch.failed,
            counts.pending,
            counts.scraped,
            counts.failed
        );

        Ok(RunSummary {
            discovery,
            fetch,
            counts,
            elapsed,
        })
    }
}

/// Runs a crawl with the parameters from `config` over an HTTP session
///
/// Failing to create the session aborts before any state is touched.
pub async fn run_crawl(config: Config) -> Result<RunSummary, CrawlError> {
    let session = HttpRenderer::launch(&config)?;
    let params = RunParams::from_config(&config.crawler);
    let coordinator = Coordinator::new(Arc::new(config), params, StopSignal::new())?;
    coordinator.execute(Box::new(session)).await
}
