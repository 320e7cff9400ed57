//! Crawl statistics
//!
//! A [`CrawlSummary`] is filled in by the coordinator while the crawl runs
//! and handed back when it ends.

use crate::crawler::StrategyKind;
use crate::filter::{FilterChainTotals, FilterStatsSnapshot};
use crate::state::CrawlPhase;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why a discovered link never reached the frontier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// Could not be parsed or normalized
    MalformedUrl,
    /// Host differs from the seed host while external links are excluded
    ExternalHost,
    /// Rejected by the named link filter
    Filter(String),
    /// The named filter failed and the link was rejected fail-closed
    FilterError(String),
    /// The scorer failed or produced a non-finite value
    ScorerError,
    /// Scored below the configured threshold
    BelowThreshold,
    /// Already admitted earlier in the crawl
    Duplicate,
    /// Fetched page rejected by the named page filter; its links were not followed
    PageFilter(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUrl => f.write_str("malformed-url"),
            Self::ExternalHost => f.write_str("external-host"),
            Self::Filter(name) => write!(f, "filter:{}", name),
            Self::FilterError(name) => write!(f, "filter-error:{}", name),
            Self::ScorerError => f.write_str("scorer-error"),
            Self::BelowThreshold => f.write_str("below-threshold"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::PageFilter(name) => write!(f, "page-filter:{}", name),
        }
    }
}

/// Totals for one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seed: String,
    pub strategy: StrategyKind,
    pub final_phase: CrawlPhase,

    /// Results handed to the caller
    pub emitted: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Fetched pages dropped by the `exclude` content-type policy
    pub excluded: usize,

    /// URLs admitted to the frontier, seed included
    pub discovered: usize,

    /// Frontier entries left unvisited when the crawl stopped
    pub abandoned: usize,

    /// Deepest emitted page
    pub max_depth_reached: u32,

    pub rejections: BTreeMap<RejectReason, u64>,
    pub filter_stats: Vec<FilterStatsSnapshot>,
    pub filter_totals: FilterChainTotals,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn new(seed: &str, strategy: StrategyKind) -> Self {
        Self {
            seed: seed.to_string(),
            strategy,
            final_phase: CrawlPhase::Init,
            emitted: 0,
            succeeded: 0,
            failed: 0,
            excluded: 0,
            discovered: 0,
            abandoned: 0,
            max_depth_reached: 0,
            rejections: BTreeMap::new(),
            filter_stats: Vec::new(),
            filter_totals: FilterChainTotals::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record_emitted(&mut self, success: bool, depth: u32) {
        self.emitted += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    pub fn record_rejection(&mut self, reason: RejectReason) {
        *self.rejections.entry(reason).or_insert(0) += 1;
    }

    pub fn total_rejections(&self) -> u64 {
        self.rejections.values().sum()
    }

    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.emitted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Seed: {}", summary.seed);
    println!("  Strategy: {}", summary.strategy);
    println!("  Final phase: {}", summary.final_phase);
    println!(
        "  Elapsed: {:.2}s ({:.2} pages/sec)",
        summary.elapsed.as_secs_f64(),
        summary.pages_per_second()
    );
    println!();

    println!("Pages:");
    println!("  Emitted: {}", summary.emitted);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    if summary.excluded > 0 {
        println!("  Excluded by content type: {}", summary.excluded);
    }
    println!("  Discovered: {}", summary.discovered);
    println!("  Left in frontier: {}", summary.abandoned);
    println!("  Deepest page: {}", summary.max_depth_reached);
    println!();

    if !summary.rejections.is_empty() {
        println!("Rejected Links ({}):", summary.total_rejections());
        let mut reasons: Vec<_> = summary.rejections.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in reasons {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    if !summary.filter_stats.is_empty() {
        println!(
            "Filters ({} candidates, {} admitted, {} rejected):",
            summary.filter_totals.evaluated,
            summary.filter_totals.admitted,
            summary.filter_totals.rejected
        );
        for stats in &summary.filter_stats {
            println!(
                "  {}: {} evaluated, {} passed, {} rejected, {} errors",
                stats.name, stats.evaluated, stats.passed, stats.rejected, stats.errors
            );
        }
        println!();
    }

    let success_rate = if summary.emitted > 0 {
        (summary.succeeded as f64 / summary.emitted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        success_rate, summary.succeeded, summary.emitted
    );
}
