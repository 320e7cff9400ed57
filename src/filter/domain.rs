use super::{FilterError, LinkContext, UrlFilter};
use crate::url::{extract_domain, matches_wildcard};
use async_trait::async_trait;
use url::Url;

/// Domain allow/deny list filter
///
/// Entries use the `example.com` / `*.example.com` wildcard syntax. The block
/// list is checked first; when the allow list is non-empty a host must match
/// one of its entries.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl DomainFilter {
    pub fn new<S: AsRef<str>>(allowed: &[S], blocked: &[S]) -> Self {
        let lower = |list: &[S]| {
            list.iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .collect::<Vec<_>>()
        };

        Self {
            allowed: lower(allowed),
            blocked: lower(blocked),
        }
    }

    /// Classifies a bare host against the lists
    pub fn admits_domain(&self, domain: &str) -> bool {
        if self.blocked.iter().any(|p| matches_wildcard(p, domain)) {
            return false;
        }

        self.allowed.is_empty() || self.allowed.iter().any(|p| matches_wildcard(p, domain))
    }
}

#[async_trait]
impl UrlFilter for DomainFilter {
    fn name(&self) -> &str {
        "domain"
    }

    async fn evaluate(&self, url: &Url, _ctx: &LinkContext) -> Result<bool, FilterError> {
        Ok(extract_domain(url)
            .map(|domain| self.admits_domain(&domain))
            .unwrap_or(false))
    }
}
