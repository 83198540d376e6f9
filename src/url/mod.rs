//! URL handling module
//!
//! This module provides URL normalization, link resolution against a page URL,
//! and the allowed-domain check applied to discovered detail links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_allowed_domain};
pub use normalize::{normalize_url, resolve_link};
