//! HTML link extraction
//!
//! This module turns a fetched page into the outbound links the crawl may
//! follow. The crawl core only depends on the [`LinkExtractor`] trait;
//! [`HtmlLinkExtractor`] is the default implementation on top of `scraper`.

use crate::crawler::fetcher::FetchedPage;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL, resolved against the page's final URL
    pub href: String,

    /// Visible text of the anchor, whitespace-collapsed
    pub anchor_text: Option<String>,
}

impl ExtractedLink {
    pub fn new(href: impl Into<String>, anchor_text: Option<&str>) -> Self {
        Self {
            href: href.into(),
            anchor_text: anchor_text
                .map(str::to_string)
                .filter(|text| !text.trim().is_empty()),
        }
    }
}

/// Extracts outbound links from a fetched page
///
/// Links are returned in document order; that order decides sibling order in
/// the frontier.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, page: &FetchedPage) -> Vec<ExtractedLink>;
}

/// Link extractor for HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// `rel="nofollow"` links are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, page: &FetchedPage) -> Vec<ExtractedLink> {
        parse_links(&page.body, &page.final_url)
    }
}

/// Parses HTML content and extracts every followable link
///
/// # Example
///
/// ```
/// use deepcrawl::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = parse_links(html, &base_url);
/// assert_eq!(links[0].href, "https://example.com/page");
/// assert_eq!(links[0].anchor_text.as_deref(), Some("Link"));
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    let text = anchor_text(&element);
                    links.push(ExtractedLink::new(absolute_url, Some(&text)));
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(ExtractedLink::new(absolute_url, None));
                }
            }
        }
    }

    links
}

fn anchor_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
