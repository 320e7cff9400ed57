//! Frontier data structures
//!
//! The frontier holds admitted, not-yet-dispatched nodes. Its shape decides
//! the traversal order:
//! - FIFO queue: breadth-first
//! - LIFO stack: depth-first
//! - max-heap on score: best-first

mod node;

pub use node::CrawlNode;

use node::Prioritized;
use std::collections::{BinaryHeap, VecDeque};

/// Ordering structure for pending crawl nodes
#[derive(Debug)]
pub struct Frontier(Inner);

#[derive(Debug)]
enum Inner {
    Fifo(VecDeque<CrawlNode>),
    Lifo(Vec<CrawlNode>),
    Priority(BinaryHeap<Prioritized>),
}

impl Frontier {
    pub fn fifo() -> Self {
        Self(Inner::Fifo(VecDeque::new()))
    }

    pub fn lifo() -> Self {
        Self(Inner::Lifo(Vec::new()))
    }

    pub fn priority() -> Self {
        Self(Inner::Priority(BinaryHeap::new()))
    }

    pub fn push(&mut self, node: CrawlNode) {
        match &mut self.0 {
            Inner::Fifo(queue) => queue.push_back(node),
            Inner::Lifo(stack) => stack.push(node),
            Inner::Priority(heap) => heap.push(Prioritized(node)),
        }
    }

    /// Inserts the children of one page, given in link-extraction order
    ///
    /// The stack variant pushes them in reverse so the first extracted link is
    /// explored first; sibling order therefore matches document order for
    /// every strategy.
    pub fn push_siblings(&mut self, nodes: Vec<CrawlNode>) {
        match &mut self.0 {
            Inner::Fifo(queue) => queue.extend(nodes),
            Inner::Lifo(stack) => stack.extend(nodes.into_iter().rev()),
            Inner::Priority(heap) => heap.extend(nodes.into_iter().map(Prioritized)),
        }
    }

    pub fn pop(&mut self) -> Option<CrawlNode> {
        match &mut self.0 {
            Inner::Fifo(queue) => queue.pop_front(),
            Inner::Lifo(stack) => stack.pop(),
            Inner::Priority(heap) => heap.pop().map(|p| p.0),
        }
    }

    /// The node `pop` would return next
    pub fn peek(&self) -> Option<&CrawlNode> {
        match &self.0 {
            Inner::Fifo(queue) => queue.front(),
            Inner::Lifo(stack) => stack.last(),
            Inner::Priority(heap) => heap.peek().map(|p| &p.0),
        }
    }

    pub fn len(&self) -> usize {
        match &self.0 {
            Inner::Fifo(queue) => queue.len(),
            Inner::Lifo(stack) => stack.len(),
            Inner::Priority(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every pending node, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let pending = self.len();
        match &mut self.0 {
            Inner::Fifo(queue) => queue.clear(),
            Inner::Lifo(stack) => stack.clear(),
            Inner::Priority(heap) => heap.clear(),
        }
        pending
    }
}
