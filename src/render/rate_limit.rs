//! Rate-limit guard for outgoing page requests
//!
//! Every request goes through [`RateLimitGuard::execute`]. When the response
//! is HTTP 429 the guard sleeps for a randomized window and re-issues the
//! same request, up to a bounded number of retries.

use crate::config::RateLimitConfig;
use crate::render::{RenderError, RenderResult};
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

const TOO_MANY_REQUESTS: u16 = 429;

/// How long to wait before retrying a rate-limited request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffWindow {
    /// Uniformly random wait in `[min, max]`
    Uniform { min: Duration, max: Duration },

    /// Always the same wait
    Fixed(Duration),
}

impl Default for BackoffWindow {
    fn default() -> Self {
        Self::Uniform {
            min: Duration::from_secs(30),
            max: Duration::from_secs(90),
        }
    }
}

impl BackoffWindow {
    pub fn sample(&self) -> Duration {
        match *self {
            Self::Fixed(wait) => wait,
            Self::Uniform { min, max } if max <= min => min,
            Self::Uniform { min, max } => {
                let ms = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
                Duration::from_millis(ms as u64)
            }
        }
    }
}

/// Anything that carries an HTTP status code
pub trait HttpStatus {
    fn status_code(&self) -> u16;
}

impl HttpStatus for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// Retries HTTP 429 responses after a randomized wait
#[derive(Debug)]
pub struct RateLimitGuard {
    window: BackoffWindow,
    max_retries: u32,
    retries: AtomicU64,
}

impl RateLimitGuard {
    pub fn new(window: BackoffWindow, max_retries: u32) -> Self {
        Self {
            window,
            max_retries,
            retries: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            BackoffWindow::Uniform {
                min: Duration::from_millis(config.min_wait_ms),
                max: Duration::from_millis(config.max_wait_ms),
            },
            config.max_retries,
        )
    }

    /// Number of rate-limit retries performed so far
    pub fn retries_performed(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Issues `request`, retrying while the response is HTTP 429
    ///
    /// Any other response, success or not, is returned as-is. Once the
    /// retries are spent the result is [`RenderError::RateLimited`].
    pub async fn execute<T, F, Fut>(&self, url: &str, mut request: F) -> RenderResult<T>
    where
        T: HttpStatus,
        F: FnMut() -> Fut,
        Fut: Future<Output = RenderResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let response = request().await?;
            if response.status_code() != TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if attempt >= self.max_retries {
                warn!(
                    "Still rate limited at {} after {} retries, giving up",
                    url, attempt
                );
                return Err(RenderError::RateLimited {
                    url: url.to_string(),
                    attempts: attempt + 1,
                });
            }

            attempt += 1;
            self.retries.fetch_add(1, Ordering::Relaxed);
            let wait = self.window.sample();
            info!(
                "Rate limited at {}, waiting {:.1}s before retry {}/{}",
                url,
                wait.as_secs_f64(),
                attempt,
                self.max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }
}
