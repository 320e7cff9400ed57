use super::{checked_score, Scorer};
use crate::filter::LinkContext;
use std::sync::Arc;
use url::Url;

/// Weighted linear combination of sub-scorers
///
/// The combined score is `sum(w_i * s_i)`, optionally divided by `sum(w_i)`
/// when normalization is enabled, and clamped to [0, 1]. A sub-scorer that
/// yields a non-finite value poisons the result, so the caller sees the
/// failure instead of a silently lowered score.
#[derive(Clone, Default)]
pub struct CompositeScorer {
    parts: Vec<(Arc<dyn Scorer>, f64)>,
    normalize: bool,
}

impl CompositeScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(mut self, scorer: impl Scorer + 'static, weight: f64) -> Self {
        self.parts.push((Arc::new(scorer), weight));
        self
    }

    /// Divides by the total weight, turning the sum into a weighted mean
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl std::fmt::Debug for CompositeScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<_> = self.parts.iter().map(|(s, w)| (s.name(), *w)).collect();
        f.debug_struct("CompositeScorer")
            .field("parts", &parts)
            .field("normalize", &self.normalize)
            .finish()
    }
}

impl Scorer for CompositeScorer {
    fn name(&self) -> &str {
        "composite"
    }

    fn score(&self, url: &Url, ctx: &LinkContext) -> f64 {
        let mut total = 0.0;
        let mut weights = 0.0;

        for (scorer, weight) in &self.parts {
            match checked_score(scorer.as_ref(), url, ctx) {
                Some(value) => total += value * weight,
                None => return f64::NAN,
            }
            weights += weight;
        }

        if self.normalize {
            if weights <= 0.0 {
                return 0.0;
            }
            total /= weights;
        }

        total.clamp(0.0, 1.0)
    }
}
