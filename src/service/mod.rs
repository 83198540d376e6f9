//! Control surface for crawl runs
//!
//! [`CrawlService`] is what a transport (the CLI, or an HTTP shell) drives:
//! it starts at most one run at a time, reports status from the persisted
//! files, forwards stop requests and serves output files by name.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{Coordinator, RunSummary};
use crate::output::{StatusReport, StatusReporter};
use crate::render::{HttpRenderer, Renderer, SessionFactory};
use crate::state::{RunGuard, RunParams, TaskState};
use crate::storage::OutputFiles;
use crate::url::normalize_url;
use crate::CrawlError;
use std::future::Future;
use std::path::{Component, Path};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Parameters of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub base_url: String,
    pub target_count: usize,
    pub resume: bool,
    pub run_in_background: bool,

    /// Requeue failed URLs before a resumed run
    pub retry_failed: bool,
}

impl StartRequest {
    /// A foreground request with the configured defaults
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            target_count: config.target_count,
            resume: config.resume,
            run_in_background: false,
            retry_failed: false,
        }
    }

    fn params(&self) -> RunParams {
        RunParams {
            base_url: self.base_url.clone(),
            target_count: self.target_count,
            resume: self.resume,
            run_in_background: self.run_in_background,
        }
    }
}

/// Answer to a start request
#[derive(Debug)]
pub enum StartResponse {
    /// The run was started; a foreground run also carries its summary
    Accepted {
        params: RunParams,
        summary: Option<RunSummary>,
    },
    Rejected { reason: String },
}

impl StartResponse {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

type RunHandle = JoinHandle<Result<RunSummary, CrawlError>>;

/// Single-run crawl service
pub struct CrawlService {
    config: Arc<Config>,
    files: OutputFiles,
    task: Arc<TaskState>,
    sessions: SessionFactory,
    background: Mutex<Option<RunHandle>>,
}

impl CrawlService {
    /// Creates a service that opens sessions with `sessions`
    pub fn new(config: Config, sessions: SessionFactory) -> Self {
        let files = OutputFiles::from_config(&config.output);
        Self {
            config: Arc::new(config),
            files,
            task: TaskState::new(),
            sessions,
            background: Mutex::new(None),
        }
    }

    /// Creates a service whose sessions are HTTP renderers
    pub fn http(config: Config) -> Self {
        let session_config = config.clone();
        let sessions: SessionFactory = Arc::new(move || {
            let renderer = HttpRenderer::launch(&session_config)?;
            Ok(Box::new(renderer) as Box<dyn Renderer>)
        });
        Self::new(config, sessions)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a run unless one is already active
    ///
    /// Session setup happens before this returns, so a session that cannot
    /// be created is reported to the caller even for background runs. A
    /// foreground run returns once it has finished.
    pub async fn start(&self, request: StartRequest) -> Result<StartResponse, CrawlError> {
        normalize_url(&request.base_url)?;
        let params = request.params();

        let guard = match self.task.try_begin(params.clone()) {
            Ok(guard) => guard,
            Err(CrawlError::AlreadyRunning) => {
                warn!("Rejected start request: a crawl is already running");
                return Ok(StartResponse::Rejected {
                    reason: "already running".to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let prepared = (self.sessions)().and_then(|session| {
            let coordinator =
                Coordinator::new(self.config.clone(), params.clone(), guard.stop_signal())?
                    .with_files(self.files.clone())
                    .retry_failed(request.retry_failed);
            Ok((coordinator, session))
        });
        let (coordinator, session) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("Failed to set up crawl run: {}", e);
                guard.fail(&e);
                return Err(e);
            }
        };

        if params.run_in_background {
            info!("Starting crawl in the background");
            let handle = tokio::spawn(async move {
                let result = coordinator.execute(session).await;
                finish(guard, &result);
                result
            });
            *self.lock_background() = Some(handle);
            Ok(StartResponse::Accepted {
                params,
                summary: None,
            })
        } else {
            let result = coordinator.execute(session).await;
            finish(guard, &result);
            result.map(|summary| StartResponse::Accepted {
                params,
                summary: Some(summary),
            })
        }
    }

    /// Progress derived from the last saved ledger and status log
    pub fn status(&self) -> StatusReport {
        StatusReporter::new(self.files.clone(), self.config.crawler.target_count)
            .report(&self.task.snapshot())
    }

    /// Requests a cooperative stop; returns whether a run was active
    ///
    /// The request is always acknowledged. The run stops before its next
    /// detail fetch.
    pub fn stop(&self) -> bool {
        let running = self.task.request_stop();
        if running {
            info!("Stop requested; the current page will finish first");
        } else {
            info!("Stop requested but no crawl is running");
        }
        running
    }

    /// Turns interrupts into stop requests, escalating on the second one
    ///
    /// The first interrupt requests a cooperative stop. A second interrupt
    /// calls `force_exit` without waiting for the current page. Returns
    /// early when `next_interrupt` fails.
    pub async fn watch_interrupts<F, Fut>(&self, mut next_interrupt: F, force_exit: impl FnOnce())
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        if let Err(e) = next_interrupt().await {
            warn!("Cannot listen for interrupts: {}", e);
            return;
        }
        warn!("Interrupt received, finishing the current page before stopping (interrupt again to quit now)");
        self.stop();

        if next_interrupt().await.is_ok() {
            error!("Second interrupt received, exiting without waiting for the current page");
            force_exit();
        }
    }

    /// Reads a file from the output directory by bare file name
    ///
    /// Returns None when the name carries any path component or the file
    /// does not exist.
    pub async fn download(&self, filename: &str) -> Option<Vec<u8>> {
        if !is_bare_file_name(filename) {
            warn!("Refusing download of {:?}", filename);
            return None;
        }
        tokio::fs::read(self.config.output.directory.join(filename))
            .await
            .ok()
    }

    /// Waits for the current background run, if any, and returns its result
    pub async fn wait(&self) -> Option<Result<RunSummary, CrawlError>> {
        let handle = self.lock_background().take()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(CrawlError::TaskAborted(e.to_string())),
        })
    }

    fn lock_background(&self) -> std::sync::MutexGuard<'_, Option<RunHandle>> {
        self.background.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the running state, recording the error of a failed run
fn finish(guard: RunGuard, result: &Result<RunSummary, CrawlError>) {
    match result {
        Ok(summary) => {
            info!(
                "Crawl run finished: {} scraped, {} failed",
                summary.fetch.scraped, summary.fetch.failed
            );
            drop(guard);
        }
        Err(e) => {
            error!("Crawl run ended with an error: {}", e);
            guard.fail(e);
        }
    }
}

fn is_bare_file_name(name: &str) -> bool {
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
