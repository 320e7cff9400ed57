use url::Url;

/// Extracts the lowercase host from a URL
///
/// The port is not part of the result, so `https://example.com:8443/`
/// and `https://example.com/` share a domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use deepcrawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs live on the same host
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
