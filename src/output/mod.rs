//! Output module for crawl results and summaries
//!
//! This module handles:
//! - Recording crawl statistics while the crawl runs
//! - Printing per-result lines and the final summary for the CLI

pub mod stats;

pub use stats::{print_summary, CrawlSummary, RejectReason};

use crate::crawler::CrawlResult;

/// Formats one result as a single status line
///
/// `OK   d=1 s=0.750 https://example.com/a (200 text/html)`
pub fn format_result_line(result: &CrawlResult) -> String {
    let status = if result.success { "OK  " } else { "FAIL" };
    let prefix = format!(
        "{} d={} s={:.3} {}",
        status, result.metadata.depth, result.metadata.score, result.url
    );

    match (&result.content, &result.error_message) {
        (Some(content), _) => format!(
            "{} ({} {})",
            prefix,
            content.status_code,
            content.content_type.as_deref().unwrap_or("-")
        ),
        (None, Some(error)) => format!("{} ({})", prefix, error),
        (None, None) => prefix,
    }
}

/// Prints one result line to stdout
pub fn print_result(result: &CrawlResult) {
    println!("{}", format_result_line(result));
}
