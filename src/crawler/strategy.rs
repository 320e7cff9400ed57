//! Frontier orderings
//!
//! All three strategies share one coordinator loop; they differ only in the
//! frontier they use and in when the next node may be dispatched.

use crate::frontier::Frontier;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Crawl traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Level by level: every page at depth d is dispatched before any page at d+1
    #[default]
    Bfs,

    /// Most recently discovered first; siblings in document order
    Dfs,

    /// Highest score first, ties in discovery order
    BestFirst,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
            Self::BestFirst => "best-first",
        }
    }

    /// Empty frontier with this strategy's ordering
    pub fn frontier(&self) -> Frontier {
        match self {
            Self::Bfs => Frontier::fifo(),
            Self::Dfs => Frontier::lifo(),
            Self::BestFirst => Frontier::priority(),
        }
    }

    /// Whether a node at `next_depth` may start while `wave_depth` is in flight
    ///
    /// BFS holds back the next level until the current wave has fully
    /// resolved, so every child of depth d is queued before any node of
    /// depth d+1 leaves the frontier. The other strategies never wait.
    pub fn may_dispatch(&self, next_depth: u32, wave_depth: Option<u32>) -> bool {
        match (self, wave_depth) {
            (Self::Bfs, Some(current)) => next_depth == current,
            _ => true,
        }
    }

    pub fn all() -> [StrategyKind; 3] {
        [Self::Bfs, Self::Dfs, Self::BestFirst]
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(Self::Bfs),
            "dfs" => Ok(Self::Dfs),
            "best-first" | "bestfirst" | "best_first" => Ok(Self::BestFirst),
            other => Err(format!(
                "unknown strategy '{}' (expected bfs, dfs or best-first)",
                other
            )),
        }
    }
}
