//! Section registry: which page each record section is read from

use crate::extract::sections::{self, Page};
use crate::extract::selectors::keys;
use crate::extract::{ExtractResult, RestaurantRecord, SelectorMap};
use crate::render::Document;
use std::fmt;
use tracing::{debug, warn};

/// Fills one part of a record from a parsed page
pub type ExtractFn = fn(&Page<'_>, &mut RestaurantRecord) -> ExtractResult<()>;

/// The page a section reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPage {
    /// The detail page itself
    Detail,

    /// A sub-page reached through the `link` selector on the detail page,
    /// ready once the `ready` selector matches
    Linked {
        link: &'static str,
        ready: &'static str,
    },
}

#[derive(Clone, Copy)]
pub struct Section {
    pub name: &'static str,
    pub page: SectionPage,
    pub extract: ExtractFn,
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.name)
            .field("page", &self.page)
            .finish()
    }
}

/// Ordered list of record sections
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl Default for SectionRegistry {
    fn default() -> Self {
        let ratings = SectionPage::Linked {
            link: keys::RATINGS_LINK,
            ready: keys::RATINGS_READY,
        };
        let menu = SectionPage::Linked {
            link: keys::MENU_LINK,
            ready: keys::MENU_READY,
        };
        let photos = SectionPage::Linked {
            link: keys::PHOTOS_LINK,
            ready: keys::PHOTOS_READY,
        };
        let reviews = SectionPage::Linked {
            link: keys::REVIEWS_LINK,
            ready: keys::REVIEWS_READY,
        };

        Self::new(vec![
            section("editorial", SectionPage::Detail, sections::editorial),
            section("information", SectionPage::Detail, sections::information),
            section("review_count", SectionPage::Detail, sections::review_count),
            section("average_ratings", ratings, sections::average_ratings),
            section("rating_distribution", ratings, sections::rating_distribution),
            section("menu", menu, sections::menu),
            section("photos", photos, sections::photos),
            section("reviews", reviews, sections::reviews),
        ])
    }
}

fn section(name: &'static str, page: SectionPage, extract: ExtractFn) -> Section {
    Section {
        name,
        page,
        extract,
    }
}

impl SectionRegistry {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Distinct sub-pages in first-use order
    pub fn linked_pages(&self) -> Vec<SectionPage> {
        let mut pages: Vec<SectionPage> = Vec::new();
        for section in &self.sections {
            if section.page != SectionPage::Detail && !pages.contains(&section.page) {
                pages.push(section.page);
            }
        }
        pages
    }

    /// Runs every section that reads `page` against `document`
    ///
    /// Returns the names of sections that failed and were left at their
    /// defaults.
    pub fn apply(
        &self,
        page: SectionPage,
        document: &Document,
        selectors: &SelectorMap,
        record: &mut RestaurantRecord,
    ) -> Vec<&'static str> {
        let parsed = Page::parse(document, selectors);
        let mut degraded = Vec::new();

        for section in self.sections.iter().filter(|s| s.page == page) {
            match (section.extract)(&parsed, record) {
                Ok(()) => debug!("Extracted {} from {}", section.name, document.url()),
                Err(e) => {
                    warn!(
                        "Section '{}' unavailable on {}: {}",
                        section.name,
                        document.url(),
                        e
                    );
                    degraded.push(section.name);
                }
            }
        }
        degraded
    }

    /// Names of the sections reading `page`
    pub fn sections_for(&self, page: SectionPage) -> Vec<&'static str> {
        self.sections
            .iter()
            .filter(|s| s.page == page)
            .map(|s| s.name)
            .collect()
    }
}
