//! Output module for reporting crawl progress
//!
//! This module handles:
//! - Deriving counts, percentage and ETA from the persisted ledger
//! - Surfacing the tail of the status log and the record file metadata
//! - Printing a status summary for the CLI

mod status;

pub use status::{print_status, progress_percentage, StatusReport, StatusReporter, RECENT_LINES};
