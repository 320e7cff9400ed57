use crate::config::types::{Config, FilterSpec, ScorerConfig};
use crate::filter::{
    ContentTypeFilter, DomainFilter, FilterChain, QualityFilter, RelevanceFilter, UrlPatternFilter,
};
use crate::scorer::{
    CompositeScorer, DomainAuthorityScorer, FreshnessScorer, KeywordRelevanceScorer,
    PathDepthScorer, Scorer,
};
use crate::ConfigError;
use std::sync::Arc;

/// Builds the filter chain described by `[[filters]]`, preserving order
pub fn build_filter_chain(specs: &[FilterSpec]) -> Result<FilterChain, ConfigError> {
    let mut chain = FilterChain::new();

    for spec in specs {
        match spec {
            FilterSpec::UrlPattern { patterns, reverse } => {
                chain.push(Arc::new(UrlPatternFilter::new(patterns, *reverse)?));
            }
            FilterSpec::Domain { allowed, blocked } => {
                chain.push(Arc::new(DomainFilter::new(allowed, blocked)));
            }
            FilterSpec::ContentType { allowed } => {
                chain.push(Arc::new(ContentTypeFilter::new(allowed)));
            }
            FilterSpec::Quality { threshold } => {
                chain.push(Arc::new(QualityFilter::new(*threshold)));
            }
            FilterSpec::Relevance { query, threshold } => {
                chain.push(Arc::new(RelevanceFilter::new(query.clone(), *threshold)));
            }
        }
        tracing::debug!("Added {} filter to chain", spec.kind());
    }

    Ok(chain)
}

/// Builds a composite scorer from the `[scorer]` section
///
/// Each enabled signal scores at full strength and is weighted inside the
/// composite, so the configured weights are directly comparable.
pub fn build_scorer(config: &ScorerConfig) -> Arc<dyn Scorer> {
    let mut composite = CompositeScorer::new();

    if !config.keywords.is_empty() && config.keyword_weight > 0.0 {
        composite = composite.with_scorer(
            KeywordRelevanceScorer::new(&config.keywords, 1.0),
            config.keyword_weight,
        );
    }

    if let Some(optimal_depth) = config.optimal_depth {
        if config.path_depth_weight > 0.0 {
            composite = composite.with_scorer(
                PathDepthScorer::new(optimal_depth, 1.0),
                config.path_depth_weight,
            );
        }
    }

    if config.freshness_weight > 0.0 {
        composite = composite.with_scorer(FreshnessScorer::new(1.0), config.freshness_weight);
    }

    if config.domain_authority_weight > 0.0 {
        let authorities = config
            .domain_weights
            .iter()
            .map(|(domain, weight)| (domain.clone(), *weight))
            .collect();
        composite = composite.with_scorer(
            DomainAuthorityScorer::new(authorities, 1.0),
            config.domain_authority_weight,
        );
    }

    if config.normalize {
        composite = composite.normalized();
    }

    tracing::debug!("Built scorer: {:?}", composite);
    Arc::new(composite)
}

impl Config {
    /// Filter chain for this configuration
    pub fn filter_chain(&self) -> Result<FilterChain, ConfigError> {
        build_filter_chain(&self.filters)
    }

    /// Scorer for this configuration, if a `[scorer]` section is present
    pub fn scorer(&self) -> Option<Arc<dyn Scorer>> {
        self.scorer.as_ref().map(build_scorer)
    }
}
