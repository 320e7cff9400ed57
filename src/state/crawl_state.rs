use crate::frontier::{CrawlNode, Frontier};
use crate::state::CrawlPhase;
use crate::CrawlError;
use std::collections::HashSet;
use url::Url;

/// Mutable state of one crawl invocation
///
/// Owned exclusively by the coordinator task for the lifetime of the crawl.
/// Workers never see it; they hand their output back to the coordinator,
/// which applies every mutation here.
#[derive(Debug)]
pub struct CrawlState {
    phase: CrawlPhase,
    visited: HashSet<String>,
    frontier: Frontier,
    in_flight: usize,
    emitted: usize,
    next_order: u64,
    next_dispatch: u64,
}

impl CrawlState {
    pub fn new(frontier: Frontier) -> Self {
        Self {
            phase: CrawlPhase::Init,
            visited: HashSet::new(),
            frontier,
            in_flight: 0,
            emitted: 0,
            next_order: 0,
            next_dispatch: 0,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Marks `url` visited and builds its node, unless it was seen before
    ///
    /// The membership test and the insertion are one operation, so a URL can
    /// be admitted at most once per crawl.
    pub fn try_admit(
        &mut self,
        url: Url,
        depth: u32,
        parent_url: Option<Url>,
        score: f64,
    ) -> Option<CrawlNode> {
        if !self.visited.insert(url.as_str().to_string()) {
            return None;
        }

        let order = self.next_order;
        self.next_order += 1;
        Some(CrawlNode::new(url, depth, parent_url, score, order))
    }

    /// Admits the seed and places it on the frontier
    pub fn admit_seed(&mut self, url: Url) -> Result<(), CrawlError> {
        let node = self.try_admit(url, 0, None, 0.0).ok_or_else(|| {
            CrawlError::InvariantViolation("seed admitted into a non-empty crawl".to_string())
        })?;
        self.frontier.push(node);
        Ok(())
    }

    /// Places the admitted children of one page on the frontier
    pub fn enqueue_siblings(&mut self, nodes: Vec<CrawlNode>) {
        self.frontier.push_siblings(nodes);
    }

    pub fn peek_next(&self) -> Option<&CrawlNode> {
        self.frontier.peek()
    }

    /// Pops the next node and counts it as in flight
    ///
    /// Returns the node with its dispatch index, the position at which it
    /// left the frontier.
    pub fn begin_dispatch(&mut self) -> Option<(CrawlNode, u64)> {
        let node = self.frontier.pop()?;
        let index = self.next_dispatch;
        self.next_dispatch += 1;
        self.in_flight += 1;
        Some((node, index))
    }

    /// Records that an in-flight node resolved
    pub fn finish_dispatch(&mut self) -> Result<(), CrawlError> {
        self.in_flight = self.in_flight.checked_sub(1).ok_or_else(|| {
            CrawlError::InvariantViolation("completion with no fetch in flight".to_string())
        })?;
        Ok(())
    }

    pub fn record_emission(&mut self) {
        self.emitted += 1;
    }

    /// Drops everything still queued; used when the crawl stops early
    pub fn abandon_frontier(&mut self) -> usize {
        self.frontier.clear()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }
}
