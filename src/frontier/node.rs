use std::cmp::Ordering;
use url::Url;

/// A URL admitted to the frontier, with its position in the crawl graph
///
/// Nodes are immutable once created: every field is fixed at admission time.
#[derive(Debug, Clone)]
pub struct CrawlNode {
    url: Url,
    depth: u32,
    parent_url: Option<Url>,
    score: f64,
    discovered_order: u64,
}

impl CrawlNode {
    pub fn new(
        url: Url,
        depth: u32,
        parent_url: Option<Url>,
        score: f64,
        discovered_order: u64,
    ) -> Self {
        Self {
            url,
            depth,
            parent_url,
            score,
            discovered_order,
        }
    }

    /// Normalized URL of the node
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent_url(&self) -> Option<&Url> {
        self.parent_url.as_ref()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// The crawl's starting point: depth 0, no parent
    pub fn is_seed(&self) -> bool {
        self.depth == 0 && self.parent_url.is_none()
    }

    /// Monotonic admission counter, unique within one crawl
    pub fn discovered_order(&self) -> u64 {
        self.discovered_order
    }
}

/// Heap entry ordering nodes for best-first traversal
///
/// Higher scores pop first; among equal scores the earlier-discovered node
/// pops first, which keeps the ordering deterministic.
#[derive(Debug, Clone)]
pub(super) struct Prioritized(pub(super) CrawlNode);

impl Ord for Prioritized {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.discovered_order.cmp(&self.0.discovered_order))
    }
}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Prioritized {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Prioritized {}
