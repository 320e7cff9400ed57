use super::{FilterError, LinkContext, UrlFilter};
use crate::url::GlobPattern;
use crate::ConfigError;
use async_trait::async_trait;
use url::Url;

/// Glob-style URL pattern filter
///
/// Patterns starting with `/` are matched against the URL path only; all other
/// patterns are matched against the full normalized URL. In the default mode a
/// URL is admitted when any pattern matches. With `reverse` set, matching URLs
/// are rejected instead.
#[derive(Debug, Clone)]
pub struct UrlPatternFilter {
    patterns: Vec<GlobPattern>,
    reverse: bool,
}

impl UrlPatternFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S], reverse: bool) -> Result<Self, ConfigError> {
        if patterns.is_empty() {
            return Err(ConfigError::Validation(
                "url-pattern filter needs at least one pattern".to_string(),
            ));
        }

        let patterns = patterns
            .iter()
            .map(|p| GlobPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns, reverse })
    }

    fn any_match(&self, url: &Url) -> bool {
        self.patterns.iter().any(|p| {
            if p.as_str().starts_with('/') {
                p.is_match(url.path())
            } else {
                p.is_match(url.as_str())
            }
        })
    }
}

#[async_trait]
impl UrlFilter for UrlPatternFilter {
    fn name(&self) -> &str {
        "url-pattern"
    }

    async fn evaluate(&self, url: &Url, _ctx: &LinkContext) -> Result<bool, FilterError> {
        Ok(self.any_match(url) != self.reverse)
    }
}
