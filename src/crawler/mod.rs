//! Crawl orchestration
//!
//! A run has two phases driven over a single rendering session:
//! - discovery walks the paginated listing and merges detail links into the ledger
//! - detail fetching drains the pending set until the run's target is met
//!
//! The [`Coordinator`] owns run initialization (fresh reset or resume), the
//! overall time limit and session teardown.

mod coordinator;
mod detail;
mod discovery;
mod supervisor;

pub use coordinator::{run_crawl, Coordinator, RunSummary};
pub use detail::DetailScraper;
pub use discovery::{DiscoveryReport, DiscoveryWalker};
pub use supervisor::{DetailFetchSupervisor, FetchReport};

use crate::extract::{keys, SelectorMap};
use crate::render::{RenderResult, Renderer};
use tracing::{debug, info};

/// Clicks the "switch to English" control when the page shows the switch modal
///
/// Returns whether a switch happened. The control is only clicked while the
/// modal is present. A missing modal, a missing control or a failed click is
/// not an error unless the session itself is gone.
pub(crate) async fn switch_language(
    renderer: &mut dyn Renderer,
    selectors: &SelectorMap,
) -> RenderResult<bool> {
    let (Ok(modal), Ok(css)) = (
        selectors.css(keys::LANG_MODAL),
        selectors.css(keys::LANG_SWITCH),
    ) else {
        return Ok(false);
    };

    let document = renderer.current_document()?;
    if !document.has_match(modal)? {
        debug!("No language switch modal on the current page");
        return Ok(false);
    }
    if !document.has_match(css)? {
        debug!("Language switch modal without a switch control");
        return Ok(false);
    }

    match renderer.click(css).await {
        Ok(()) => Ok(true),
        Err(e) if e.aborts_record() => Err(e),
        Err(e) => {
            info!("Language switch not available or already handled: {}", e);
            Ok(false)
        }
    }
}
