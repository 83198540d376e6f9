//! Extraction rules, one function per record section
//!
//! Every section function reads a parsed [`Page`] and writes a single part of
//! the record. A function assigns its field only once the whole value has
//! been read, so an error leaves the field untouched.

use crate::extract::selectors::keys;
use crate::extract::{
    ExtractError, ExtractResult, MenuItem, MenuSection, RatingBucket, RestaurantRecord, Review,
    SelectorMap,
};
use crate::render::Document;
use crate::url::{normalize_url, resolve_link};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

static GAUGE_WIDTH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"width:\s*(\d+)%").ok());

/// A parsed document plus the selector table used to read it
///
/// Holds a `scraper::Html`, so it lives only inside synchronous code.
pub struct Page<'a> {
    html: Html,
    url: &'a Url,
    selectors: &'a SelectorMap,
}

impl<'a> Page<'a> {
    pub fn parse(document: &'a Document, selectors: &'a SelectorMap) -> Self {
        Self {
            html: document.parse(),
            url: document.url(),
            selectors,
        }
    }

    pub fn url(&self) -> &Url {
        self.url
    }

    fn select(&self, name: &str) -> ExtractResult<Vec<ElementRef<'_>>> {
        let selector = self.selectors.compile(name)?;
        Ok(self.html.select(&selector).collect())
    }

    fn within<'e>(&self, scope: ElementRef<'e>, name: &str) -> ExtractResult<Vec<ElementRef<'e>>> {
        let selector = self.selectors.compile(name)?;
        Ok(scope.select(&selector).collect())
    }

    fn first_text(&self, name: &str) -> ExtractResult<Option<String>> {
        Ok(self
            .select(name)?
            .into_iter()
            .map(element_text)
            .find(|text| !text.is_empty()))
    }

    fn first_text_within(&self, scope: ElementRef<'_>, name: &str) -> ExtractResult<Option<String>> {
        Ok(self
            .within(scope, name)?
            .into_iter()
            .map(element_text)
            .find(|text| !text.is_empty()))
    }

    fn texts(&self, name: &str) -> ExtractResult<Vec<String>> {
        Ok(self.select(name)?.into_iter().map(element_text).collect())
    }

    /// First `href` under `name`, resolved and normalized
    pub fn link(&self, name: &str) -> ExtractResult<Option<Url>> {
        Ok(self.links(name)?.into_iter().next())
    }

    /// Every distinct `href` under `name` in page order
    pub fn links(&self, name: &str) -> ExtractResult<Vec<Url>> {
        let mut seen = HashSet::new();
        let links = self
            .select(name)?
            .into_iter()
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, self.url))
            .filter_map(|url| normalize_url(url.as_str()).ok())
            .filter(|url| seen.insert(url.to_string()))
            .collect();
        Ok(links)
    }
}

/// Text content with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_count(field: &str, text: &str) -> ExtractResult<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().map_err(|_| ExtractError::Malformed {
        field: field.to_string(),
        value: text.to_string(),
    })
}

fn parse_score(field: &str, text: &str) -> ExtractResult<f64> {
    text.trim().parse().map_err(|_| ExtractError::Malformed {
        field: field.to_string(),
        value: text.to_string(),
    })
}

/// Percentage from an inline `width: N%` style; 0 when absent
fn gauge_percentage(style: Option<&str>) -> u32 {
    style
        .and_then(|style| GAUGE_WIDTH.as_ref()?.captures(style))
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Detail links and the next-page link of one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub detail_links: Vec<Url>,
    pub next_page: Option<Url>,
}

pub fn extract_listing(document: &Document, selectors: &SelectorMap) -> ExtractResult<ListingPage> {
    let page = Page::parse(document, selectors);
    Ok(ListingPage {
        detail_links: page.links(keys::LISTING_DETAIL_LINK)?,
        next_page: page.link(keys::LISTING_NEXT_PAGE)?,
    })
}

/// Headline plus description; the description joins the visible and hidden parts
pub fn editorial(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let headline = page.first_text(keys::EDITORIAL_HEADLINE)?;
    let visible = page.first_text(keys::EDITORIAL_VISIBLE)?;
    let hidden = page.first_text(keys::EDITORIAL_HIDDEN)?;

    if headline.is_none() && visible.is_none() {
        return Err(ExtractError::NotFound("editorial overview".to_string()));
    }

    let description = match (visible, hidden) {
        (Some(visible), Some(hidden)) => Some(visible + &hidden),
        (visible, _) => visible,
    };

    record.editorial_overview.headline = headline;
    record.editorial_overview.description = description;
    Ok(())
}

pub fn information(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let mut info = BTreeMap::new();
    for row in page.select(keys::INFO_ROW)? {
        let label = page.first_text_within(row, keys::INFO_LABEL)?;
        let value = page.first_text_within(row, keys::INFO_VALUE)?;
        if let (Some(label), Some(value)) = (label, value) {
            info.insert(label, value);
        }
    }

    if info.is_empty() {
        return Err(ExtractError::NotFound("restaurant information".to_string()));
    }
    record.restaurant_information = info;
    Ok(())
}

pub fn review_count(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let text = page
        .first_text(keys::REVIEW_COUNT)?
        .ok_or_else(|| ExtractError::NotFound("review count".to_string()))?;
    record.review_count = Some(parse_count("review count", &text)?);
    Ok(())
}

/// Category scores from the ratings page, paired title to score in order
pub fn average_ratings(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let titles = page.texts(keys::RATINGS_TITLE)?;
    let scores = page.texts(keys::RATINGS_SCORE)?;
    debug!("Rating titles {:?}, scores {:?}", titles, scores);

    if titles.is_empty() || scores.is_empty() {
        return Err(ExtractError::NotFound("rating titles or scores".to_string()));
    }

    let mut averages = BTreeMap::new();
    for (title, score) in titles.into_iter().zip(scores) {
        averages.insert(title, parse_score("average rating", &score)?);
    }
    record.review_rating.average_ratings = averages;
    Ok(())
}

/// Score bands from the ratings page
///
/// A band missing its range or people count is skipped with a warning.
pub fn rating_distribution(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let items = page.select(keys::RATINGS_BUCKET)?;
    if items.is_empty() {
        return Err(ExtractError::NotFound("rating distribution".to_string()));
    }

    let mut buckets = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match read_bucket(page, item) {
            Ok(bucket) => buckets.push(bucket),
            Err(e) => warn!(
                "Skipping distribution item {} on {}: {}",
                index + 1,
                page.url(),
                e
            ),
        }
    }

    record.review_rating.rating_distribution = buckets;
    Ok(())
}

fn read_bucket(page: &Page<'_>, item: ElementRef<'_>) -> ExtractResult<RatingBucket> {
    let range = page
        .first_text_within(item, keys::RATINGS_BUCKET_RANGE)?
        .ok_or_else(|| ExtractError::NotFound("rating range".to_string()))?;
    let style = page
        .within(item, keys::RATINGS_BUCKET_GAUGE)?
        .into_iter()
        .find_map(|gauge| gauge.value().attr("style"));
    let people = page
        .first_text_within(item, keys::RATINGS_BUCKET_PEOPLE)?
        .ok_or_else(|| ExtractError::NotFound("people count".to_string()))?;

    Ok(RatingBucket {
        range,
        percentage: gauge_percentage(style),
        people: parse_count("people count", &people)?,
    })
}

pub fn menu(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let mut sections = Vec::new();
    for block in page.select(keys::MENU_SECTION)? {
        let title = page.first_text_within(block, keys::MENU_SECTION_TITLE)?;
        let mut items = Vec::new();
        for item in page.within(block, keys::MENU_ITEM)? {
            if let Some(name) = page.first_text_within(item, keys::MENU_ITEM_NAME)? {
                items.push(MenuItem {
                    name,
                    price: page.first_text_within(item, keys::MENU_ITEM_PRICE)?,
                });
            }
        }
        sections.push(MenuSection { title, items });
    }

    if sections.is_empty() {
        return Err(ExtractError::NotFound("menu".to_string()));
    }
    record.menu = sections;
    Ok(())
}

pub fn photos(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let mut seen = HashSet::new();
    let photos: Vec<String> = page
        .select(keys::PHOTOS_IMAGE)?
        .into_iter()
        .filter_map(|img| {
            let value = img.value();
            value.attr("src").or_else(|| value.attr("data-original"))
        })
        .filter_map(|src| resolve_link(src, page.url()))
        .map(String::from)
        .filter(|src| seen.insert(src.clone()))
        .collect();

    if photos.is_empty() {
        return Err(ExtractError::NotFound("photos".to_string()));
    }
    record.photos = photos;
    Ok(())
}

pub fn reviews(page: &Page<'_>, record: &mut RestaurantRecord) -> ExtractResult<()> {
    let mut reviews = Vec::new();
    for item in page.select(keys::REVIEWS_ITEM)? {
        let rating = page
            .first_text_within(item, keys::REVIEWS_RATING)?
            .and_then(|text| parse_score("review rating", &text).ok());
        reviews.push(Review {
            author: page.first_text_within(item, keys::REVIEWS_AUTHOR)?,
            rating,
            title: page.first_text_within(item, keys::REVIEWS_TITLE)?,
            body: page.first_text_within(item, keys::REVIEWS_BODY)?,
        });
    }

    if reviews.is_empty() {
        return Err(ExtractError::NotFound("reviews".to_string()));
    }
    record.review_rating.reviews = reviews;
    Ok(())
}
