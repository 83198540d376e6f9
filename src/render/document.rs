use crate::render::{RenderError, RenderResult};
use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// A loaded page: its final URL and raw HTML
///
/// The parsed tree is built on demand with [`Document::parse`] and is never
/// held across an await point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: Url,
    html: String,
}

impl Document {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Returns true if any element matches `selector`
    pub fn has_match(&self, selector: &str) -> RenderResult<bool> {
        let selector = parse_selector(selector)?;
        Ok(self.parse().select(&selector).next().is_some())
    }

    /// Resolves the `href` of the first matching element that has one
    pub fn link_target(&self, selector: &str) -> RenderResult<Option<Url>> {
        let selector = parse_selector(selector)?;
        let html = self.parse();
        let target = html
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .find_map(|href| resolve_link(href, &self.url));
        Ok(target)
    }
}

pub(crate) fn parse_selector(selector: &str) -> RenderResult<Selector> {
    Selector::parse(selector).map_err(|_| RenderError::InvalidSelector(selector.to_string()))
}
