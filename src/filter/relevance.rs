use super::{FilterError, LinkContext, UrlFilter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "www", "com", "org", "net", "html", "htm", "php", "index", "http",
    "https", "of", "to", "in", "on", "an", "is", "at",
];

/// Lowercased alphanumeric tokens with stopwords and one-character runs removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Computes similarity between a reference query and candidate text
///
/// Implementations may call out to an external service, so evaluation is
/// async and fallible. Scores are expected in [0, 1].
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    async fn similarity(&self, query: &str, text: &str) -> Result<f64, FilterError>;
}

/// Cosine similarity over term-frequency vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalModel;

impl LexicalModel {
    pub fn cosine(query: &str, text: &str) -> f64 {
        let a = term_frequencies(query);
        let b = term_frequencies(text);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f64 = a
            .iter()
            .filter_map(|(term, x)| b.get(term).map(|y| x * y))
            .sum();
        let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();

        dot / (norm(&a) * norm(&b))
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut tf = HashMap::new();
    for token in tokenize(text) {
        *tf.entry(token).or_insert(0.0) += 1.0;
    }
    tf
}

#[async_trait]
impl RelevanceModel for LexicalModel {
    async fn similarity(&self, query: &str, text: &str) -> Result<f64, FilterError> {
        Ok(Self::cosine(query, text))
    }
}

/// Admits links whose URL and anchor text are similar enough to a query
///
/// The candidate text is the URL's host and path plus the anchor text. A
/// non-finite similarity counts as an evaluation error and rejects.
#[derive(Clone)]
pub struct RelevanceFilter {
    query: String,
    threshold: f64,
    model: Arc<dyn RelevanceModel>,
}

impl RelevanceFilter {
    /// Relevance filter backed by [`LexicalModel`]
    pub fn new(query: impl Into<String>, threshold: f64) -> Self {
        Self::with_model(query, threshold, Arc::new(LexicalModel))
    }

    pub fn with_model(
        query: impl Into<String>,
        threshold: f64,
        model: Arc<dyn RelevanceModel>,
    ) -> Self {
        Self {
            query: query.into(),
            threshold,
            model,
        }
    }

    fn candidate_text(url: &Url, ctx: &LinkContext) -> String {
        let mut text = format!("{} {}", url.host_str().unwrap_or_default(), url.path());
        if let Some(anchor) = &ctx.anchor_text {
            text.push(' ');
            text.push_str(anchor);
        }
        text
    }
}

impl std::fmt::Debug for RelevanceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceFilter")
            .field("query", &self.query)
            .field("threshold", &self.threshold)
            .finish()
    }
}

#[async_trait]
impl UrlFilter for RelevanceFilter {
    fn name(&self) -> &str {
        "relevance"
    }

    async fn evaluate(&self, url: &Url, ctx: &LinkContext) -> Result<bool, FilterError> {
        let text = Self::candidate_text(url, ctx);
        let similarity = self.model.similarity(&self.query, &text).await?;

        if !similarity.is_finite() {
            return Err(FilterError::Evaluation {
                filter: self.name().to_string(),
                message: format!("non-finite similarity {}", similarity),
            });
        }

        Ok(similarity >= self.threshold)
    }
}
