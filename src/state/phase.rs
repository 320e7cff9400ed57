/// Crawl phase definitions
///
/// A crawl moves through these phases under the control of its coordinator.
use std::fmt;

/// Represents the lifecycle phase of one crawl invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Created, seed not yet dispatched
    Init,

    /// Dispatching fetches from the frontier
    Running,

    /// Page budget reached; in-flight fetches are finishing, nothing new is dispatched
    Draining,

    // ===== Terminal Phases =====
    /// Frontier exhausted or budget reached, all work finished
    Completed,

    /// Stopped by a cancellation signal; in-flight fetches were abandoned
    Cancelled,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if new fetches may still be dispatched in this phase
    pub fn accepts_dispatch(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the transition `self -> next` is legal
    ///
    /// INIT → RUNNING → {DRAINING → COMPLETED} | COMPLETED | CANCELLED.
    /// Cancellation is reachable from every non-terminal phase.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        matches!(
            (self, next),
            (Init, Running)
                | (Init, Cancelled)
                | (Running, Draining)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Draining, Completed)
                | (Draining, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Init,
            Self::Running,
            Self::Draining,
            Self::Completed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
