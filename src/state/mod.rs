//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: which ledger set a detail URL belongs to (pending, scraped, failed)
//! - `FetchOutcome`: the timed result of one detail fetch, as written to the status log
//! - `TaskState`: the process-wide single-run guard with its cooperative stop flag

mod outcome;
mod task_state;
mod url_state;

// Re-export main types
pub use outcome::FetchOutcome;
pub use task_state::{RunGuard, RunParams, StopSignal, TaskState, TaskStatus};
pub use url_state::UrlState;
