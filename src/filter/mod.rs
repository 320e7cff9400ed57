//! Filter chain for candidate URLs
//!
//! A filter is a named predicate over a URL and its link context. Filters are
//! grouped into an ordered [`FilterChain`] that is evaluated left-to-right and
//! stops at the first rejection, so cheap syntactic filters should be placed
//! before expensive semantic ones.
//!
//! Filters run in one of two stages:
//! - [`FilterStage::Link`]: on every discovered link, before frontier admission
//! - [`FilterStage::Page`]: on a fetched page, before its links are extracted
//!
//! Evaluation errors are fail-closed: the candidate is rejected and a warning
//! is logged.

mod chain;
mod content_type;
mod domain;
mod quality;
mod relevance;
mod url_pattern;

pub use chain::{FilterChain, FilterChainTotals, FilterStatsSnapshot, FilterVerdict};
pub use content_type::ContentTypeFilter;
pub use domain::DomainFilter;
pub use quality::{url_quality, QualityFilter};
pub use relevance::{tokenize, LexicalModel, RelevanceFilter, RelevanceModel};
pub use url_pattern::UrlPatternFilter;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors raised while evaluating a filter
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Filter '{filter}' failed: {message}")]
    Evaluation { filter: String, message: String },

    #[error("Relevance backend unavailable: {0}")]
    Backend(String),
}

/// Where in the crawl pipeline a filter is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    /// Applied to each discovered link before it can enter the frontier
    Link,
    /// Applied to a fetched page before link extraction
    Page,
}

/// Context available to filters and scorers about a candidate URL
#[derive(Debug, Clone, Default)]
pub struct LinkContext {
    /// Text of the anchor that pointed at the URL, if any
    pub anchor_text: Option<String>,

    /// The page the URL was discovered on
    pub parent_url: Option<Url>,

    /// Depth the candidate would occupy (or occupies, for a fetched page)
    pub depth: u32,

    /// Content-Type of a fetched page; only set for the page stage
    pub content_type: Option<String>,
}

impl LinkContext {
    /// Context for a link discovered on `parent` at `depth`
    pub fn for_link(parent: &Url, depth: u32, anchor_text: Option<String>) -> Self {
        Self {
            anchor_text,
            parent_url: Some(parent.clone()),
            depth,
            content_type: None,
        }
    }

    /// Context for a fetched page
    pub fn for_page(depth: u32, content_type: Option<String>) -> Self {
        Self {
            depth,
            content_type,
            ..Self::default()
        }
    }
}

/// A predicate that admits or rejects a candidate URL
///
/// Implementations must not mutate shared state in a way that changes their
/// answer: the same filter instance is evaluated concurrently by every worker.
#[async_trait]
pub trait UrlFilter: Send + Sync {
    /// Short name used in logs and statistics
    fn name(&self) -> &str;

    /// Pipeline stage the filter belongs to
    fn stage(&self) -> FilterStage {
        FilterStage::Link
    }

    /// Returns `Ok(true)` to admit and `Ok(false)` to reject
    async fn evaluate(&self, url: &Url, ctx: &LinkContext) -> Result<bool, FilterError>;
}
