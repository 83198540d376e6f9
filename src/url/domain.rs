use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rst_crawler::url::extract_domain;
///
/// let url = Url::parse("https://TABELOG.com/en/tokyo/").unwrap();
/// assert_eq!(extract_domain(&url), Some("tabelog.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a URL belongs to one of the allowed domains
///
/// A host matches an allowed domain when it is equal to it or is one of its
/// subdomains. An empty allow list accepts every URL.
pub fn is_allowed_domain(url: &Url, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let Some(host) = extract_domain(url) else {
        return false;
    };

    allowed.iter().any(|domain| {
        let domain = domain.to_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    })
}
