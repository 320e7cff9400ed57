use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid"];

/// Normalizes a URL into the canonical form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http and https schemes
/// 3. Lowercase the host and drop a default port
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters by key, keeping each one as written
/// 8. Remove empty query string (trailing ?)
///
/// Two URLs that name the same page normalize to the same string, which is what
/// the visited set keys on.
///
/// # Examples
///
/// ```
/// use deepcrawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM:443/docs/./page/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    if url.port().is_some() && url.port() == default_port(url.scheme()) {
        url.set_port(None)
            .map_err(|_| UrlError::Malformed("Failed to clear default port".to_string()))?;
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let filtered_params = filter_and_sort_query_params(query);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            let query = filtered_params.join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
///
/// # Arguments
///
/// * `query` - The raw query string, without the leading `?`
///
/// # Returns
///
/// The surviving `key[=value]` segments exactly as written, ordered by key.
/// The sort is stable, so repeated keys keep their relative order, and
/// segments are never decoded or re-encoded.
fn filter_and_sort_query_params(query: &str) -> Vec<String> {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| (segment.split_once('=').map_or(segment, |(key, _)| key), segment))
        .filter(|(key, _)| !is_tracking_param(key))
        .collect();

    params.sort_by(|a, b| a.0.cmp(b.0));
    params
        .into_iter()
        .map(|(_, segment)| segment.to_string())
        .collect()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
