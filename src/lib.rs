//! DeepCrawl: a deep-crawl engine
//!
//! This crate explores the link graph reachable from a seed URL under depth,
//! page-count and relevance constraints. Three frontier orderings are available
//! (breadth-first, depth-first and best-first), candidate links pass through a
//! composable filter chain and are ranked by a scorer, and results are delivered
//! either as a batch or as a cancellable stream.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod frontier;
pub mod output;
pub mod scorer;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// These are coordinator-level failures that abort a crawl. Failures of an
/// individual page are reported as unsuccessful `CrawlResult`s instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Crawl invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Crawl worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Crawl coordinator task failed: {0}")]
    Coordinator(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings};
pub use crawler::{
    CancelHandle, CrawlOutput, CrawlResult, CrawlStream, DeepCrawler, Fetcher, LinkExtractor,
    StrategyKind,
};
pub use filter::{FilterChain, UrlFilter};
pub use output::CrawlSummary;
pub use scorer::Scorer;
pub use state::CrawlPhase;
pub use url::{extract_domain, normalize_url};
