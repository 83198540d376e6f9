//! Discovery Walker: paginates listing pages and fills the pending set

use crate::config::DiscoveryPolicy;
use crate::crawler::switch_language;
use crate::extract::{extract_listing, SelectorMap};
use crate::render::Renderer;
use crate::storage::LedgerWriter;
use crate::url::{is_allowed_domain, normalize_url};
use crate::CrawlError;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// What one discovery pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub pages_visited: usize,
    pub links_found: usize,
    pub newly_added: usize,
    pub skipped_foreign: usize,

    /// True when the early-stop policy ended the walk
    pub stopped_early: bool,
}

/// Walks listing pages sequentially from each seed
pub struct DiscoveryWalker<'a> {
    selectors: &'a SelectorMap,
    allowed_domains: &'a [String],
    policy: DiscoveryPolicy,
    target_count: usize,
    max_pages: usize,
}

impl<'a> DiscoveryWalker<'a> {
    pub fn new(selectors: &'a SelectorMap) -> Self {
        Self {
            selectors,
            allowed_domains: &[],
            policy: DiscoveryPolicy::Full,
            target_count: 0,
            max_pages: 0,
        }
    }

    /// Restricts detail links to these domains and their subdomains
    pub fn allowed_domains(mut self, domains: &'a [String]) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn policy(mut self, policy: DiscoveryPolicy, target_count: usize) -> Self {
        self.policy = policy;
        self.target_count = target_count;
        self
    }

    /// Caps the number of listing pages per pass; 0 means no cap
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn has_enough(&self, ledger: &LedgerWriter) -> bool {
        self.policy == DiscoveryPolicy::EarlyStop
            && self.target_count > 0
            && ledger.ledger().pending().len() >= self.target_count
    }

    /// Walks every seed until its last page has no next link
    ///
    /// A listing page that cannot be loaded, or whose language switch stays
    /// rate limited, ends the walk for its seed. A lost or closed session ends
    /// the whole pass. Only ledger persistence errors are returned.
    pub async fn walk(
        &self,
        renderer: &mut dyn Renderer,
        ledger: &mut LedgerWriter,
        seeds: &[String],
    ) -> Result<DiscoveryReport, CrawlError> {
        let mut report = DiscoveryReport::default();
        let mut visited: HashSet<String> = HashSet::new();

        'seeds: for seed in seeds {
            let mut next = match normalize_url(seed) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Skipping seed {}: {}", seed, e);
                    continue;
                }
            };

            while let Some(page_url) = next.take() {
                if self.max_pages > 0 && report.pages_visited >= self.max_pages {
                    info!("Reached the listing page limit of {}", self.max_pages);
                    break 'seeds;
                }
                if !visited.insert(page_url.to_string()) {
                    warn!("Listing page {} already visited, ending this walk", page_url);
                    break;
                }

                if let Err(e) = renderer.open(page_url.as_str()).await {
                    error!("Failed to load listing page {}: {}", page_url, e);
                    break;
                }
                match switch_language(renderer, self.selectors).await {
                    Ok(_) => {}
                    Err(e) if e.is_rate_limited() => {
                        error!("Rate limited switching language on {}: {}", page_url, e);
                        break;
                    }
                    Err(e) => {
                        error!("Lost the session on {}: {}", page_url, e);
                        break 'seeds;
                    }
                }

                let document = match renderer.current_document() {
                    Ok(document) => document,
                    Err(e) => {
                        error!("No document for listing page {}: {}", page_url, e);
                        break;
                    }
                };
                let listing = extract_listing(&document, self.selectors)?;
                report.pages_visited += 1;
                report.links_found += listing.detail_links.len();

                let (allowed, foreign): (Vec<_>, Vec<_>) = listing
                    .detail_links
                    .into_iter()
                    .partition(|url| is_allowed_domain(url, self.allowed_domains));
                report.skipped_foreign += foreign.len();

                let added = ledger.merge_discovered(allowed.iter().map(|url| url.to_string()))?;
                report.newly_added += added;
                info!(
                    "Listing page {}: {} detail links, {} new, {} pending",
                    document.url(),
                    allowed.len(),
                    added,
                    ledger.ledger().pending().len()
                );

                if self.has_enough(ledger) {
                    info!(
                        "Pending pool covers the target of {}, stopping discovery",
                        self.target_count
                    );
                    report.stopped_early = true;
                    break 'seeds;
                }

                next = listing.next_page;
            }
        }

        Ok(report)
    }
}
