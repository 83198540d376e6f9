use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Timed result of one detail fetch
///
/// Every attempted URL produces exactly one outcome, and every outcome is
/// appended to the status log regardless of success.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        url: String,
        elapsed: Duration,
        at: DateTime<Utc>,
    },
    Failure {
        url: String,
        error: String,
        elapsed: Duration,
        at: DateTime<Utc>,
    },
}

impl FetchOutcome {
    pub fn success(url: impl Into<String>, elapsed: Duration) -> Self {
        Self::Success {
            url: url.into(),
            elapsed,
            at: Utc::now(),
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>, elapsed: Duration) -> Self {
        Self::Failure {
            url: url.into(),
            error: error.into(),
            elapsed,
            at: Utc::now(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failure { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Formats the outcome as one status log line (without trailing newline)
    ///
    /// ```text
    /// SUCCESS: <url> | Time: <seconds>s | <ISO8601 timestamp>
    /// FAILED: <url> | Time: <seconds>s | <ISO8601 timestamp> | Error: <message>
    /// ```
    pub fn to_log_line(&self) -> String {
        match self {
            Self::Success { url, elapsed, at } => format!(
                "SUCCESS: {} | Time: {:.2}s | {}",
                url,
                elapsed.as_secs_f64(),
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            Self::Failure {
                url,
                error,
                elapsed,
                at,
            } => format!(
                "FAILED: {} | Time: {:.2}s | {} | Error: {}",
                url,
                elapsed.as_secs_f64(),
                at.to_rfc3339_opts(SecondsFormat::Secs, true),
                // one line per outcome
                error.replace(['\r', '\n'], " ")
            ),
        }
    }
}
