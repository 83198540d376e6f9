use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL so the same detail page always maps to one ledger key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host (the parser lowercases it)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters (`utm_*` and friends)
/// 6. Remove an empty query string
///
/// The path is kept as served, including any trailing slash, because listing
/// sites route detail pages by exact path.
///
/// # Examples
///
/// ```
/// use rst_crawler::url::normalize_url;
///
/// let url = normalize_url("https://TABELOG.com/en/tokyo/A1301/13002134/?utm_source=x#menu").unwrap();
/// assert_eq!(url.as_str(), "https://tabelog.com/en/tokyo/A1301/13002134/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Resolves an `href` found on `base` into a normalized absolute URL
///
/// Returns None for links that can never be detail or listing pages:
/// empty hrefs, fragment-only anchors, `javascript:`, `mailto:`, `tel:` and
/// `data:` URIs, and anything that does not resolve to HTTP(S).
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://tabelog.com/en/tokyo/rstLst/2/").unwrap()
    }

    #[test]
    fn test_keeps_trailing_slash() {
        let result = normalize_url("https://tabelog.com/en/tokyo/A1301/13002134/").unwrap();
        assert_eq!(result.as_str(), "https://tabelog.com/en/tokyo/A1301/13002134/");
    }

    #[test]
    fn test_lowercases_host() {
        let result = normalize_url("https://TabeLog.COM/en/").unwrap();
        assert_eq!(result.host_str(), Some("tabelog.com"));
    }

    #[test]
    fn test_removes_fragment() {
        let result = normalize_url("https://tabelog.com/en/#top").unwrap();
        assert_eq!(result.as_str(), "https://tabelog.com/en/");
    }

    #[test]
    fn test_removes_tracking_params_keeps_others() {
        let result =
            normalize_url("https://tabelog.com/en/tokyo/rstLst/?utm_campaign=a&SrtT=rt&gclid=1")
                .unwrap();
        assert_eq!(result.as_str(), "https://tabelog.com/en/tokyo/rstLst/?SrtT=rt");
    }

    #[test]
    fn test_removes_empty_query() {
        let result = normalize_url("https://tabelog.com/en/?utm_source=mail").unwrap();
        assert_eq!(result.query(), None);
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            normalize_url("ftp://tabelog.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve_link("/en/tokyo/A1301/13002134/", &base()).unwrap();
        assert_eq!(resolved.as_str(), "https://tabelog.com/en/tokyo/A1301/13002134/");
    }

    #[test]
    fn test_resolve_relative_path_link() {
        let resolved = resolve_link("../3/", &base()).unwrap();
        assert_eq!(resolved.as_str(), "https://tabelog.com/en/tokyo/rstLst/3/");
    }

    #[test]
    fn test_resolve_skips_non_navigations() {
        assert!(resolve_link("", &base()).is_none());
        assert!(resolve_link("#reviews", &base()).is_none());
        assert!(resolve_link("javascript:void(0)", &base()).is_none());
        assert!(resolve_link("mailto:info@tabelog.com", &base()).is_none());
        assert!(resolve_link("tel:+81312345678", &base()).is_none());
    }
}
