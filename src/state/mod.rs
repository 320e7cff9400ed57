//! State module for tracking a single crawl invocation
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of a crawl (init, running, draining, completed, cancelled)
//! - `CrawlState`: the visited set, frontier and counters owned by one coordinator

mod crawl_state;
mod phase;

pub use crawl_state::CrawlState;
pub use phase::CrawlPhase;
