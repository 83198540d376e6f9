//! Named CSS selector table
//!
//! Extraction rules refer to selectors by name. The built-in table targets
//! the Tabelog page layout; any entry can be replaced from the `[selectors]`
//! section of the config file.

use crate::extract::ExtractError;
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;

/// Selector names understood by the crawler
pub mod keys {
    pub const LANG_MODAL: &str = "lang.modal";
    pub const LANG_SWITCH: &str = "lang.switch";

    pub const LISTING_DETAIL_LINK: &str = "listing.detail-link";
    pub const LISTING_NEXT_PAGE: &str = "listing.next-page";

    pub const EDITORIAL_HEADLINE: &str = "editorial.headline";
    pub const EDITORIAL_VISIBLE: &str = "editorial.visible";
    pub const EDITORIAL_HIDDEN: &str = "editorial.hidden";

    pub const INFO_ROW: &str = "info.row";
    pub const INFO_LABEL: &str = "info.label";
    pub const INFO_VALUE: &str = "info.value";

    pub const REVIEW_COUNT: &str = "review.count";

    pub const RATINGS_LINK: &str = "ratings.link";
    pub const RATINGS_READY: &str = "ratings.ready";
    pub const RATINGS_TITLE: &str = "ratings.title";
    pub const RATINGS_SCORE: &str = "ratings.score";
    pub const RATINGS_BUCKET: &str = "ratings.bucket";
    pub const RATINGS_BUCKET_RANGE: &str = "ratings.bucket-range";
    pub const RATINGS_BUCKET_GAUGE: &str = "ratings.bucket-gauge";
    pub const RATINGS_BUCKET_PEOPLE: &str = "ratings.bucket-people";

    pub const MENU_LINK: &str = "menu.link";
    pub const MENU_READY: &str = "menu.ready";
    pub const MENU_SECTION: &str = "menu.section";
    pub const MENU_SECTION_TITLE: &str = "menu.section-title";
    pub const MENU_ITEM: &str = "menu.item";
    pub const MENU_ITEM_NAME: &str = "menu.item-name";
    pub const MENU_ITEM_PRICE: &str = "menu.item-price";

    pub const PHOTOS_LINK: &str = "photos.link";
    pub const PHOTOS_READY: &str = "photos.ready";
    pub const PHOTOS_IMAGE: &str = "photos.image";

    pub const REVIEWS_LINK: &str = "reviews.link";
    pub const REVIEWS_READY: &str = "reviews.ready";
    pub const REVIEWS_ITEM: &str = "reviews.item";
    pub const REVIEWS_AUTHOR: &str = "reviews.author";
    pub const REVIEWS_RATING: &str = "reviews.rating";
    pub const REVIEWS_TITLE: &str = "reviews.title";
    pub const REVIEWS_BODY: &str = "reviews.body";
}

const DEFAULT_SELECTORS: &[(&str, &str)] = &[
    (keys::LANG_MODAL, "div.c-lang-switch__inner.js-lang-change-text-en"),
    (
        keys::LANG_SWITCH,
        "a.c-btn.c-lang-switch__btn.js-inbound-link.js-analytics-lang-switch",
    ),
    (keys::LISTING_DETAIL_LINK, "a.list-rst__rst-name-target"),
    (keys::LISTING_NEXT_PAGE, "a.c-pagination__arrow--next"),
    (keys::EDITORIAL_HEADLINE, "h3.pr-comment-title.js-pr-title"),
    (keys::EDITORIAL_VISIBLE, "span.pr-comment__first"),
    (keys::EDITORIAL_HIDDEN, "span.pr-comment__over"),
    (keys::INFO_ROW, "table.rstinfo-table__table tr"),
    (keys::INFO_LABEL, "th"),
    (keys::INFO_VALUE, "td"),
    (keys::REVIEW_COUNT, "a.rdheader-rating__review-target em.num"),
    (keys::RATINGS_LINK, "a#rating"),
    (keys::RATINGS_READY, "div.ratings-contents"),
    (
        keys::RATINGS_TITLE,
        "dl.ratings-contents__table dt.ratings-contents__table-txt",
    ),
    (
        keys::RATINGS_SCORE,
        "dl.ratings-contents__table dd.ratings-contents__table-score",
    ),
    (keys::RATINGS_BUCKET, "li.ratings-contents__item"),
    (
        keys::RATINGS_BUCKET_RANGE,
        "b.c-rating-v2__val.c-rating-v2__val--strong.ratings-contents__item-score",
    ),
    (keys::RATINGS_BUCKET_GAUGE, "span.ratings-contents__item-gauge"),
    (
        keys::RATINGS_BUCKET_PEOPLE,
        "strong.ratings-contents__item-num-strong",
    ),
    (keys::MENU_LINK, "a#menu"),
    (keys::MENU_READY, "div.rstdtl-menu-lst"),
    (keys::MENU_SECTION, "div.rstdtl-menu-lst"),
    (keys::MENU_SECTION_TITLE, "h4.rstdtl-menu-lst__heading"),
    (keys::MENU_ITEM, "div.rstdtl-menu-lst__contents"),
    (keys::MENU_ITEM_NAME, "p.rstdtl-menu-lst__menu-title"),
    (keys::MENU_ITEM_PRICE, "p.rstdtl-menu-lst__price"),
    (keys::PHOTOS_LINK, "a#photo"),
    (keys::PHOTOS_READY, "ul.rstdtl-photo__list"),
    (keys::PHOTOS_IMAGE, "ul.rstdtl-photo__list img"),
    (keys::REVIEWS_LINK, "a#review"),
    (keys::REVIEWS_READY, "div.rvw-item"),
    (keys::REVIEWS_ITEM, "div.rvw-item"),
    (keys::REVIEWS_AUTHOR, "a.rvw-item__rvwr-name"),
    (keys::REVIEWS_RATING, "b.c-rating-v2__val"),
    (keys::REVIEWS_TITLE, "p.rvw-item__title"),
    (keys::REVIEWS_BODY, "div.rvw-item__rvw-comment"),
];

/// Table of named CSS selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMap {
    entries: BTreeMap<String, String>,
}

impl Default for SelectorMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SELECTORS
                .iter()
                .map(|(name, css)| (name.to_string(), css.to_string()))
                .collect(),
        }
    }
}

impl SelectorMap {
    /// Built-in table with `overrides` applied
    ///
    /// Unknown names and selectors that do not parse are rejected.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut map = Self::default();
        for (name, css) in overrides {
            if !map.entries.contains_key(name) {
                return Err(ConfigError::Validation(format!(
                    "Unknown selector name '{}'",
                    name
                )));
            }
            if Selector::parse(css).is_err() {
                return Err(ConfigError::InvalidSelector {
                    name: name.clone(),
                    selector: css.clone(),
                });
            }
            map.entries.insert(name.clone(), css.clone());
        }
        Ok(map)
    }

    /// The CSS text registered under `name`
    pub fn css(&self, name: &str) -> Result<&str, ExtractError> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ExtractError::UnknownSelector(name.to_string()))
    }

    /// The compiled selector registered under `name`
    pub fn compile(&self, name: &str) -> Result<Selector, ExtractError> {
        let css = self.css(name)?;
        Selector::parse(css).map_err(|_| ExtractError::InvalidSelector {
            name: name.to_string(),
            selector: css.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_compile() {
        let map = SelectorMap::default();
        for name in map.names() {
            assert!(map.compile(name).is_ok(), "default '{}' must parse", name);
        }
        assert_eq!(
            map.css(keys::LISTING_DETAIL_LINK).unwrap(),
            "a.list-rst__rst-name-target"
        );
    }

    #[test]
    fn test_override_replaces_entry() {
        let mut overrides = BTreeMap::new();
        overrides.insert(keys::LISTING_NEXT_PAGE.to_string(), "a.next".to_string());

        let map = SelectorMap::with_overrides(&overrides).unwrap();
        assert_eq!(map.css(keys::LISTING_NEXT_PAGE).unwrap(), "a.next");
        assert_eq!(map.css(keys::RATINGS_LINK).unwrap(), "a#rating");
    }

    #[test]
    fn test_override_rejects_unknown_name() {
        let mut overrides = BTreeMap::new();
        overrides.insert("listing.nope".to_string(), "a".to_string());
        assert!(matches!(
            SelectorMap::with_overrides(&overrides),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_override_rejects_bad_css() {
        let mut overrides = BTreeMap::new();
        overrides.insert(keys::RATINGS_LINK.to_string(), "a[[".to_string());
        assert!(matches!(
            SelectorMap::with_overrides(&overrides),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_unknown_lookup() {
        let map = SelectorMap::default();
        assert!(matches!(
            map.css("missing"),
            Err(ExtractError::UnknownSelector(_))
        ));
    }
}
