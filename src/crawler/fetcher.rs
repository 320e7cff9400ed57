//! Page fetching
//!
//! The crawl core only depends on the [`Fetcher`] trait. [`HttpFetcher`] is
//! the default implementation on top of `reqwest`:
//! - Builds one shared HTTP client with the configured user agent
//! - Follows redirects (max 10 hops) and decompresses gzip/brotli bodies
//! - Maps HTTP 4xx/5xx responses to [`FetchError::Status`]
//!
//! The per-page timeout is applied by the coordinator around any fetcher, so
//! implementations do not need to enforce it themselves.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: Url,

    /// Final URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,

    /// Page body
    pub body: String,
}

/// Why a page could not be fetched
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP status {status_code}")]
    Status { status_code: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("Fetch failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_redirect() {
            FetchError::Redirect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status_code: status.as_u16(),
            }
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Retrieves pages for the crawl
///
/// Called concurrently from crawl workers, so implementations must be
/// shareable across tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use deepcrawl::config::UserAgentConfig;
/// use deepcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        let final_url = response.url().clone();

        if status.is_client_error() || status.is_server_error() {
            tracing::debug!("{} answered {}", url, status);
            return Err(FetchError::Status {
                status_code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}
