use crate::crawler::fetcher::FetchedPage;
use crate::frontier::CrawlNode;
use chrono::{DateTime, Utc};

/// Where a result sits in the crawl
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    /// Link distance from the seed
    pub depth: u32,

    /// Score the page was admitted with (0 for the seed)
    pub score: f64,

    /// Page the URL was discovered on; `None` for the seed
    pub parent_url: Option<String>,

    /// Position at which the page left the frontier
    pub dispatch_index: u64,
}

/// What the fetcher returned for a page
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl From<FetchedPage> for PageContent {
    fn from(page: FetchedPage) -> Self {
        Self {
            final_url: page.final_url.to_string(),
            status_code: page.status_code,
            content_type: page.content_type,
            body: page.body,
        }
    }
}

/// Outcome of crawling one page
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    /// Normalized URL of the page
    pub url: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: ResultMetadata,
    /// Fetched content; only present on success
    pub content: Option<PageContent>,
    pub fetched_at: DateTime<Utc>,
}

impl CrawlResult {
    pub(crate) fn succeeded(node: &CrawlNode, dispatch_index: u64, page: FetchedPage) -> Self {
        Self {
            url: node.url().to_string(),
            success: true,
            error_message: None,
            metadata: metadata(node, dispatch_index),
            content: Some(page.into()),
            fetched_at: Utc::now(),
        }
    }

    pub(crate) fn failed(node: &CrawlNode, dispatch_index: u64, error: String) -> Self {
        Self {
            url: node.url().to_string(),
            success: false,
            error_message: Some(error),
            metadata: metadata(node, dispatch_index),
            content: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn depth(&self) -> u32 {
        self.metadata.depth
    }

    pub fn score(&self) -> f64 {
        self.metadata.score
    }
}

fn metadata(node: &CrawlNode, dispatch_index: u64) -> ResultMetadata {
    ResultMetadata {
        depth: node.depth(),
        score: node.score(),
        parent_url: node.parent_url().map(|u| u.to_string()),
        dispatch_index,
    }
}
