use super::Scorer;
use crate::filter::LinkContext;
use url::Url;

/// Scores a URL by the fraction of configured keywords it mentions
///
/// A keyword counts as present when it occurs (case-insensitively) in the URL
/// text or in the anchor text. The fraction of matched keywords is multiplied
/// by `weight` and clamped to [0, 1].
#[derive(Debug, Clone)]
pub struct KeywordRelevanceScorer {
    keywords: Vec<String>,
    weight: f64,
}

impl KeywordRelevanceScorer {
    pub fn new<S: AsRef<str>>(keywords: &[S], weight: f64) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self { keywords, weight }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Scorer for KeywordRelevanceScorer {
    fn name(&self) -> &str {
        "keyword-relevance"
    }

    fn score(&self, url: &Url, ctx: &LinkContext) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }

        let url_text = url.as_str().to_lowercase();
        let anchor_text = ctx
            .anchor_text
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let matches = self
            .keywords
            .iter()
            .filter(|k| url_text.contains(k.as_str()) || anchor_text.contains(k.as_str()))
            .count();

        let fraction = matches as f64 / self.keywords.len() as f64;
        (fraction * self.weight).clamp(0.0, 1.0)
    }
}
