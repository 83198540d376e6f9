use crate::config::CrawlerConfig;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Parameters a crawl run was started with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunParams {
    pub base_url: String,
    pub target_count: usize,
    pub resume: bool,
    pub run_in_background: bool,
}

impl RunParams {
    /// Foreground parameters taken from the configured defaults
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            target_count: config.target_count,
            resume: config.resume,
            run_in_background: false,
        }
    }
}

/// Snapshot of the background task as seen by the status interface
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStatus {
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub current_params: Option<RunParams>,

    /// Parameters of the most recent run, kept after it finishes
    pub last_params: Option<RunParams>,

    /// Start of the most recent run, kept after it finishes
    pub last_start_time: Option<DateTime<Utc>>,

    /// Error of the most recent run, if it ended with one
    pub last_error: Option<String>,

    pub stop_requested: bool,
}

/// Cooperative stop flag shared between the control surface and a run
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the running crawl to stop at its next per-URL checkpoint
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Process-wide crawl task state
///
/// Transitions are idle -> running (via [`TaskState::try_begin`]) and
/// running -> idle (when the returned [`RunGuard`] is dropped). A second
/// `try_begin` while running is rejected, never queued.
#[derive(Debug, Default)]
pub struct TaskState {
    status: Mutex<TaskStatus>,
    stop: StopSignal,
}

impl TaskState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks a run as started, or rejects the request if one is active
    pub fn try_begin(self: &Arc<Self>, params: RunParams) -> Result<RunGuard, CrawlError> {
        let mut status = self.lock();
        if status.is_running {
            return Err(CrawlError::AlreadyRunning);
        }

        self.stop.reset();
        status.is_running = true;
        let now = Utc::now();
        status.start_time = Some(now);
        status.last_start_time = Some(now);
        status.current_params = Some(params.clone());
        status.last_params = Some(params);
        status.last_error = None;
        status.stop_requested = false;

        Ok(RunGuard {
            state: Arc::clone(self),
        })
    }

    /// Returns a copy of the current status
    pub fn snapshot(&self) -> TaskStatus {
        self.lock().clone()
    }

    /// Sets the stop flag; returns whether a run was active to receive it
    pub fn request_stop(&self) -> bool {
        let mut status = self.lock();
        if !status.is_running {
            return false;
        }
        status.stop_requested = true;
        self.stop.stop();
        true
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn finish(&self, error: Option<String>) {
        let mut status = self.lock();
        status.is_running = false;
        status.start_time = None;
        status.current_params = None;
        if error.is_some() {
            status.last_error = error;
        }
    }

    fn lock(&self) -> MutexGuard<'_, TaskStatus> {
        // the status is plain data, so a poisoned lock is still consistent
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds the running state for the lifetime of one crawl run
///
/// Dropping the guard returns the task to idle, which also covers runs that
/// end through an error or a panic.
#[derive(Debug)]
pub struct RunGuard {
    state: Arc<TaskState>,
}

impl RunGuard {
    /// Records the run's error before the guard is released
    pub fn fail(self, error: &CrawlError) {
        self.state.finish(Some(error.to_string()));
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.state.stop_signal()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.state.finish(None);
    }
}
