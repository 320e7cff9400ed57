use crate::config::types::{Config, CrawlSettings, FilterSpec, ScorerConfig, UserAgentConfig};
use crate::url::GlobPattern;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_user_agent_config(&config.user_agent)?;
    for spec in &config.filters {
        validate_filter_spec(spec)?;
    }
    if let Some(scorer) = &config.scorer {
        validate_scorer_config(scorer)?;
    }
    Ok(())
}

/// Validates crawl budget and timing settings
pub fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.fetch_concurrency < 1 || settings.fetch_concurrency > 256 {
        return Err(ConfigError::Validation(format!(
            "fetch_concurrency must be between 1 and 256, got {}",
            settings.fetch_concurrency
        )));
    }

    if settings.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if let Some(threshold) = settings.score_threshold {
        validate_unit_interval("score_threshold", threshold)?;
    }

    if settings.per_page_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "per_page_timeout_ms must be > 0".to_string(),
        ));
    }

    if settings.cancel_grace_ms == 0 {
        return Err(ConfigError::Validation(
            "cancel_grace_ms must be > 0".to_string(),
        ));
    }

    if settings.crawl_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "crawl_timeout_ms must be > 0 when set".to_string(),
        ));
    }

    if settings.stream_buffer < 1 {
        return Err(ConfigError::Validation(
            "stream_buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates one filter chain entry
fn validate_filter_spec(spec: &FilterSpec) -> Result<(), ConfigError> {
    match spec {
        FilterSpec::UrlPattern { patterns, .. } => {
            if patterns.is_empty() {
                return Err(ConfigError::Validation(
                    "url-pattern filter needs at least one pattern".to_string(),
                ));
            }
            for pattern in patterns {
                GlobPattern::new(pattern)?;
            }
        }
        FilterSpec::Domain { allowed, blocked } => {
            if allowed.is_empty() && blocked.is_empty() {
                return Err(ConfigError::Validation(
                    "domain filter needs an allowed or blocked list".to_string(),
                ));
            }
            for pattern in allowed.iter().chain(blocked) {
                validate_domain_pattern(pattern)?;
            }
        }
        FilterSpec::ContentType { allowed } => {
            if allowed.is_empty() {
                return Err(ConfigError::Validation(
                    "content-type filter needs at least one MIME type".to_string(),
                ));
            }
            for mime in allowed {
                validate_mime_pattern(mime)?;
            }
        }
        FilterSpec::Quality { threshold } => {
            validate_unit_interval("quality threshold", *threshold)?;
        }
        FilterSpec::Relevance { query, threshold } => {
            if query.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "relevance filter query cannot be empty".to_string(),
                ));
            }
            validate_unit_interval("relevance threshold", *threshold)?;
        }
    }
    Ok(())
}

/// Validates scorer weights
fn validate_scorer_config(config: &ScorerConfig) -> Result<(), ConfigError> {
    let weights = [
        ("keyword_weight", config.keyword_weight),
        ("path_depth_weight", config.path_depth_weight),
        ("freshness_weight", config.freshness_weight),
        ("domain_authority_weight", config.domain_authority_weight),
    ];
    for (name, weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a finite non-negative number, got {}",
                name, weight
            )));
        }
    }

    if config.path_depth_weight > 0.0 && config.optimal_depth.is_none() {
        return Err(ConfigError::Validation(
            "path_depth_weight requires optimal_depth".to_string(),
        ));
    }

    for (pattern, authority) in &config.domain_weights {
        validate_domain_pattern(pattern)?;
        validate_unit_interval("domain weight", *authority)?;
    }

    let any_signal = (!config.keywords.is_empty() && config.keyword_weight > 0.0)
        || config.path_depth_weight > 0.0
        || config.freshness_weight > 0.0
        || config.domain_authority_weight > 0.0;
    if !any_signal {
        return Err(ConfigError::Validation(
            "scorer section enables no signal".to_string(),
        ));
    }

    Ok(())
}

fn validate_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates a `type/subtype` MIME pattern, allowing `*` wildcards
fn validate_mime_pattern(mime: &str) -> Result<(), ConfigError> {
    match mime.split_once('/') {
        Some((ty, sub)) if !ty.is_empty() && !sub.is_empty() && !sub.contains('/') => Ok(()),
        _ => Err(ConfigError::InvalidPattern(format!(
            "'{}' is not a MIME type pattern",
            mime
        ))),
    }
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // "localhost" is the one dotless host worth naming in a crawl config
    if !domain.contains('.') && domain != "localhost" {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
