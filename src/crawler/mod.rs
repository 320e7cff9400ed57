//! Crawler module: the deep-crawl engine
//!
//! This module contains the crawl orchestration, including:
//! - The [`DeepCrawler`] entry point with batch and streaming delivery
//! - BFS, DFS and best-first traversal over a shared coordinator loop
//! - The fetcher and link extractor collaborators and their default
//!   HTTP/HTML implementations

mod coordinator;
mod emitter;
mod engine;
mod fetcher;
mod parser;
mod result;
mod strategy;

pub use emitter::{CancelHandle, CrawlStream};
pub use engine::{CrawlOutput, DeepCrawler};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{parse_links, ExtractedLink, HtmlLinkExtractor, LinkExtractor};
pub use result::{CrawlResult, PageContent, ResultMetadata};
pub use strategy::StrategyKind;
