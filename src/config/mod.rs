//! Configuration module for DeepCrawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turns the `[[filters]]` and `[scorer]` sections into live
//! filter chains and scorers.
//!
//! # Example
//!
//! ```no_run
//! use deepcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod builders;
mod parser;
mod types;
mod validation;

pub use types::{
    Config, ContentTypePolicy, CrawlSettings, FilterSpec, ScorerConfig, UserAgentConfig,
};

pub use builders::{build_filter_chain, build_scorer};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_crawl_settings;
