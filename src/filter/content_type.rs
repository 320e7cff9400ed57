use super::{FilterError, FilterStage, LinkContext, UrlFilter};
use async_trait::async_trait;
use url::Url;

/// Content-Type allow list applied to fetched pages
///
/// Runs at [`FilterStage::Page`]: a rejected page yields no further links.
/// Whether the page itself still produces a result is decided by the
/// crawl's content-type policy. Entries may be exact (`text/html`), a type
/// wildcard (`text/*`) or `*/*`. A page without a Content-Type header is
/// rejected.
#[derive(Debug, Clone)]
pub struct ContentTypeFilter {
    allowed: Vec<String>,
}

impl ContentTypeFilter {
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Self {
        Self {
            allowed: allowed
                .iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Only HTML and XHTML documents
    pub fn html_only() -> Self {
        Self::new(&["text/html", "application/xhtml+xml"])
    }

    pub fn admits_mime(&self, header: &str) -> bool {
        let mime = essence(header);
        if mime.is_empty() {
            return false;
        }

        self.allowed.iter().any(|allowed| {
            if allowed == "*/*" {
                return true;
            }
            match allowed.strip_suffix("/*") {
                Some(major) => mime.split('/').next() == Some(major),
                None => *allowed == mime,
            }
        })
    }
}

/// The `type/subtype` part of a Content-Type header
fn essence(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

#[async_trait]
impl UrlFilter for ContentTypeFilter {
    fn name(&self) -> &str {
        "content-type"
    }

    fn stage(&self) -> FilterStage {
        FilterStage::Page
    }

    async fn evaluate(&self, _url: &Url, ctx: &LinkContext) -> Result<bool, FilterError> {
        Ok(ctx
            .content_type
            .as_deref()
            .map(|ct| self.admits_mime(ct))
            .unwrap_or(false))
    }
}
