//! Render and extract one detail page into a record

use crate::crawler::switch_language;
use crate::extract::{Page, RestaurantRecord, SectionPage, SectionRegistry, SelectorMap};
use crate::render::{Document, RenderError, Renderer};
use crate::CrawlError;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Builds a [`RestaurantRecord`] from a detail page and its linked sub-pages
///
/// The detail page must load; everything after that is best-effort. A
/// sub-page that is missing, fails to load or never becomes ready leaves its
/// sections at their defaults. Errors that mean the session can no longer be
/// trusted (persistent rate limiting, a lost session) fail the record.
pub struct DetailScraper<'a> {
    selectors: &'a SelectorMap,
    registry: &'a SectionRegistry,
    ready_timeout: Duration,
}

impl<'a> DetailScraper<'a> {
    pub fn new(
        selectors: &'a SelectorMap,
        registry: &'a SectionRegistry,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            selectors,
            registry,
            ready_timeout,
        }
    }

    pub async fn scrape(
        &self,
        renderer: &mut dyn Renderer,
        url: &str,
    ) -> Result<RestaurantRecord, CrawlError> {
        renderer.open(url).await?;
        switch_language(renderer, self.selectors).await?;

        let detail = renderer.current_document()?;
        let mut record = RestaurantRecord::new(url);
        self.registry
            .apply(SectionPage::Detail, &detail, self.selectors, &mut record);

        let targets = self.linked_targets(&detail)?;
        for (page, target) in targets {
            let Some(target) = target else {
                warn!(
                    "No link to {:?} on {}",
                    self.registry.sections_for(page),
                    url
                );
                continue;
            };

            if let Err(e) = self.load_sub_page(renderer, page, &target).await {
                if e.aborts_record() {
                    return Err(e.into());
                }
                warn!(
                    "Sub-page {} unavailable, leaving {:?} empty: {}",
                    target,
                    self.registry.sections_for(page),
                    e
                );
                continue;
            }

            let document = renderer.current_document()?;
            self.registry
                .apply(page, &document, self.selectors, &mut record);
        }

        debug!("Built record for {}", url);
        Ok(record)
    }

    /// Resolves every linked sub-page against the detail document
    fn linked_targets(
        &self,
        detail: &Document,
    ) -> Result<Vec<(SectionPage, Option<Url>)>, CrawlError> {
        let page = Page::parse(detail, self.selectors);
        let mut targets = Vec::new();
        for linked in self.registry.linked_pages() {
            if let SectionPage::Linked { link, .. } = linked {
                targets.push((linked, page.link(link)?));
            }
        }
        Ok(targets)
    }

    async fn load_sub_page(
        &self,
        renderer: &mut dyn Renderer,
        page: SectionPage,
        target: &Url,
    ) -> Result<(), RenderError> {
        renderer.open(target.as_str()).await?;
        if let SectionPage::Linked { ready, .. } = page {
            let css = self
                .selectors
                .css(ready)
                .map_err(|_| RenderError::InvalidSelector(ready.to_string()))?;
            renderer.wait_for(css, self.ready_timeout).await?;
        }
        Ok(())
    }
}
