use crate::crawler::StrategyKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlSettings,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    /// Filter chain, in evaluation order
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub scorer: Option<ScorerConfig>,
}

/// What happens to a fetched page rejected by a page-stage filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentTypePolicy {
    /// Emit the page's result (success, with content) but extract no links from it
    #[default]
    Emit,
    /// Drop the page from the output entirely; it does not count toward max-pages
    Exclude,
}

/// Budget and behavior of one crawl
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Frontier ordering
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Maximum link distance from the seed (seed is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of emitted results; unbounded when absent
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,

    /// Follow links whose host differs from the seed host
    #[serde(rename = "include-external", default)]
    pub include_external: bool,

    /// Minimum score a candidate needs to enter the frontier
    #[serde(rename = "score-threshold", default)]
    pub score_threshold: Option<f64>,

    /// Maximum number of concurrent fetches
    #[serde(rename = "fetch-concurrency", default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Per-page fetch timeout (milliseconds)
    #[serde(rename = "per-page-timeout-ms", default = "default_per_page_timeout_ms")]
    pub per_page_timeout_ms: u64,

    /// Grace period granted to in-flight fetches after cancellation (milliseconds)
    #[serde(rename = "cancel-grace-ms", default = "default_cancel_grace_ms")]
    pub cancel_grace_ms: u64,

    /// Overall deadline after which the crawl is cancelled (milliseconds)
    #[serde(rename = "crawl-timeout-ms", default)]
    pub crawl_timeout_ms: Option<u64>,

    /// Deliver results incrementally instead of as one batch
    #[serde(default)]
    pub stream: bool,

    /// Results buffered ahead of a slow stream consumer
    #[serde(rename = "stream-buffer", default = "default_stream_buffer")]
    pub stream_buffer: usize,

    #[serde(rename = "content-type-policy", default)]
    pub content_type_policy: ContentTypePolicy,
}

fn default_fetch_concurrency() -> usize {
    5
}

fn default_per_page_timeout_ms() -> u64 {
    15_000
}

fn default_cancel_grace_ms() -> u64 {
    2_000
}

fn default_stream_buffer() -> usize {
    16
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_depth: 2,
            max_pages: None,
            include_external: false,
            score_threshold: None,
            fetch_concurrency: default_fetch_concurrency(),
            per_page_timeout_ms: default_per_page_timeout_ms(),
            cancel_grace_ms: default_cancel_grace_ms(),
            crawl_timeout_ms: None,
            stream: false,
            stream_buffer: default_stream_buffer(),
            content_type_policy: ContentTypePolicy::default(),
        }
    }
}

impl CrawlSettings {
    pub fn new(strategy: StrategyKind, max_depth: u32) -> Self {
        Self {
            strategy,
            max_depth,
            ..Self::default()
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_include_external(mut self, include_external: bool) -> Self {
        self.include_external = include_external;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency;
        self
    }

    pub fn with_per_page_timeout(mut self, timeout: Duration) -> Self {
        self.per_page_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn with_crawl_timeout(mut self, timeout: Duration) -> Self {
        self.crawl_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_stream_buffer(mut self, buffer: usize) -> Self {
        self.stream_buffer = buffer;
        self
    }

    pub fn with_content_type_policy(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type_policy = policy;
        self
    }

    pub fn per_page_timeout(&self) -> Duration {
        Duration::from_millis(self.per_page_timeout_ms)
    }

    /// Grace period on cancellation, never longer than one page timeout
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms.min(self.per_page_timeout_ms))
    }

    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.crawl_timeout_ms.map(Duration::from_millis)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Contact email for crawler operator
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DeepCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// One entry of the filter chain
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterSpec {
    /// Glob patterns over the URL (or its path when the pattern starts with `/`)
    UrlPattern {
        patterns: Vec<String>,
        #[serde(default)]
        reverse: bool,
    },

    /// Domain allow/deny lists with `*.example.com` wildcards
    Domain {
        #[serde(default)]
        allowed: Vec<String>,
        #[serde(default)]
        blocked: Vec<String>,
    },

    /// MIME allow list checked on fetched pages
    ContentType { allowed: Vec<String> },

    /// Minimum heuristic URL quality
    Quality { threshold: f64 },

    /// Minimum lexical similarity to a reference query
    Relevance { query: String, threshold: f64 },
}

impl FilterSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UrlPattern { .. } => "url-pattern",
            Self::Domain { .. } => "domain",
            Self::ContentType { .. } => "content-type",
            Self::Quality { .. } => "quality",
            Self::Relevance { .. } => "relevance",
        }
    }
}

/// Scorer signals and their weights
///
/// Signals with weight 0 are left out. The combined score is the weighted
/// sum of the enabled signals, clamped to [0, 1], or the weighted mean when
/// `normalize` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScorerConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    #[serde(default)]
    pub optimal_depth: Option<usize>,
    #[serde(default)]
    pub path_depth_weight: f64,
    #[serde(default)]
    pub freshness_weight: f64,
    #[serde(default)]
    pub domain_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub domain_authority_weight: f64,
    #[serde(default)]
    pub normalize: bool,
}

fn default_keyword_weight() -> f64 {
    1.0
}
