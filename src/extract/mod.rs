//! Record extraction
//!
//! Extraction is data-driven. A [`SelectorMap`] names every CSS selector and
//! a [`SectionRegistry`] lists the record sections, the page each one reads
//! and the function that fills it. Sections fail independently: a failing
//! section is logged and leaves its part of the record at the default value.

#[cfg(test)]
pub(crate) mod fixtures;
mod record;
mod registry;
pub mod sections;
mod selectors;

pub use record::{
    EditorialOverview, MenuItem, MenuSection, RatingBucket, RestaurantRecord, Review, ReviewRating,
};
pub use registry::{Section, SectionPage, SectionRegistry};
pub use sections::{extract_listing, ListingPage, Page};
pub use selectors::{keys, SelectorMap};

use thiserror::Error;

/// Errors raised by a single extraction rule
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No selector named '{0}'")]
    UnknownSelector(String),

    #[error("Selector '{name}' does not parse: {selector}")]
    InvalidSelector { name: String, selector: String },

    #[error("Nothing matched for {0}")]
    NotFound(String),

    #[error("Could not read {field} from '{value}'")]
    Malformed { field: String, value: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;
