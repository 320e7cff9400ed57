use super::{FilterStage, LinkContext, UrlFilter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

/// Invocation counters for a single filter
#[derive(Debug, Default)]
struct FilterStats {
    evaluated: AtomicU64,
    passed: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
}

impl FilterStats {
    fn snapshot(&self, name: &str) -> FilterStatsSnapshot {
        FilterStatsSnapshot {
            name: name.to_string(),
            evaluated: self.evaluated.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a filter's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStatsSnapshot {
    pub name: String,
    pub evaluated: u64,
    pub passed: u64,
    /// Rejections by the predicate itself (errors are counted separately)
    pub rejected: u64,
    pub errors: u64,
}

/// Candidates seen by the chain as a whole, across both stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterChainTotals {
    pub evaluated: u64,
    pub admitted: u64,
    pub rejected: u64,
}

/// Outcome of running a chain over one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Admit,
    Reject {
        /// Name of the filter that stopped the candidate
        filter: String,
        /// Set when the rejection came from an evaluation error
        error: Option<String>,
    },
}

impl FilterVerdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

struct ChainEntry {
    filter: Arc<dyn UrlFilter>,
    stats: FilterStats,
}

/// Ordered sequence of filters with short-circuit rejection
#[derive(Default)]
pub struct FilterChain {
    entries: Vec<ChainEntry>,
    evaluated: AtomicU64,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

impl FilterChain {
    /// Creates an empty chain, which admits everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter; evaluation follows insertion order
    pub fn with_filter(mut self, filter: impl UrlFilter + 'static) -> Self {
        self.push(Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn UrlFilter>) {
        self.entries.push(ChainEntry {
            filter,
            stats: FilterStats::default(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the filters in evaluation order
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.filter.name().to_string())
            .collect()
    }

    /// True when at least one filter runs at the given stage
    pub fn has_stage(&self, stage: FilterStage) -> bool {
        self.entries.iter().any(|e| e.filter.stage() == stage)
    }

    /// Runs every filter of `stage` in order, stopping at the first rejection
    ///
    /// Filters of other stages are skipped without being counted. An erroring
    /// filter rejects the candidate.
    pub async fn evaluate(
        &self,
        url: &Url,
        ctx: &LinkContext,
        stage: FilterStage,
    ) -> FilterVerdict {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        let verdict = self.run_stage(url, ctx, stage).await;
        match verdict {
            FilterVerdict::Admit => self.admitted.fetch_add(1, Ordering::Relaxed),
            FilterVerdict::Reject { .. } => self.rejected.fetch_add(1, Ordering::Relaxed),
        };
        verdict
    }

    async fn run_stage(&self, url: &Url, ctx: &LinkContext, stage: FilterStage) -> FilterVerdict {
        for entry in self.entries.iter().filter(|e| e.filter.stage() == stage) {
            entry.stats.evaluated.fetch_add(1, Ordering::Relaxed);

            match entry.filter.evaluate(url, ctx).await {
                Ok(true) => {
                    entry.stats.passed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(false) => {
                    entry.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Filter {} rejected {}", entry.filter.name(), url);
                    return FilterVerdict::Reject {
                        filter: entry.filter.name().to_string(),
                        error: None,
                    };
                }
                Err(e) => {
                    entry.stats.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        "Filter {} failed on {}, rejecting: {}",
                        entry.filter.name(),
                        url,
                        e
                    );
                    return FilterVerdict::Reject {
                        filter: entry.filter.name().to_string(),
                        error: Some(e.to_string()),
                    };
                }
            }
        }

        FilterVerdict::Admit
    }

    pub fn totals(&self) -> FilterChainTotals {
        FilterChainTotals {
            evaluated: self.evaluated.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// Counters for every filter, in chain order
    pub fn stats(&self) -> Vec<FilterStatsSnapshot> {
        self.entries
            .iter()
            .map(|e| e.stats.snapshot(e.filter.name()))
            .collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
