//! Relevance scorers for candidate URLs
//!
//! A scorer maps a URL and its link context to a relevance value in [0, 1].
//! Scorers are pure: they hold only configuration and are called concurrently
//! from every crawl worker.

mod composite;
mod keyword;
mod signals;

pub use composite::CompositeScorer;
pub use keyword::KeywordRelevanceScorer;
pub use signals::{DomainAuthorityScorer, FreshnessScorer, PathDepthScorer};

use crate::filter::LinkContext;
use url::Url;

/// Computes a relevance score for a candidate URL
pub trait Scorer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Score in [0, 1]; higher means more relevant
    fn score(&self, url: &Url, ctx: &LinkContext) -> f64;
}

/// Runs a scorer and validates its output
///
/// Returns `None` when the scorer produced a non-finite value, which callers
/// treat as a failed evaluation. Finite values are clamped to [0, 1].
pub fn checked_score(scorer: &dyn Scorer, url: &Url, ctx: &LinkContext) -> Option<f64> {
    let value = scorer.score(url, ctx);
    if value.is_finite() {
        Some(value.clamp(0.0, 1.0))
    } else {
        None
    }
}
