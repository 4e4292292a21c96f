//! Shortest-path search subsystem.
//!
//! # Data Flow
//! ```text
//! Weighted RoadNetwork + endpoints + SearchBudget
//!     → astar.rs (primary route on assigned weights)
//!     → bidirectional.rs (distance baseline on edge length)
//!     → alternatives.rs (edge-removal alternatives around the primary)
//!     → metrics.rs (distance / time / cost / emissions per path)
//! ```
//!
//! # Design Decisions
//! - Searches are synchronous and CPU-bound; callers run them on the
//!   blocking pool
//! - "No path" is `Ok(None)`; only budget overruns and bad input are errors
//! - A budget overrun never yields a partial path

pub mod alternatives;
pub mod astar;
pub mod bidirectional;
pub mod metrics;

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::network::{Edge, EdgeIndex, NodeIndex, RoadNetwork};

pub use alternatives::alternative_routes;
pub use astar::shortest_path;
pub use bidirectional::bidirectional_shortest_path;
pub use metrics::PathMetrics;

/// How often (in queue pops) a search consults its deadline.
const DEADLINE_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("search exceeded its {budget:?} budget after exploring {explored} nodes")]
    Timeout { budget: Duration, explored: usize },

    #[error("node {0} is not in the network")]
    UnknownNode(String),

    #[error("invalid search transition from {from:?} to {to:?}")]
    InvalidTransition { from: SearchPhase, to: SearchPhase },
}

/// Lifecycle of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Initialized,
    Searching,
    Found,
    NoPath,
    TimedOut,
}

impl SearchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SearchPhase::Found | SearchPhase::NoPath | SearchPhase::TimedOut
        )
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(self, next: SearchPhase) -> Result<SearchPhase, SearchError> {
        let allowed = matches!(
            (self, next),
            (SearchPhase::Initialized, SearchPhase::Searching)
                | (SearchPhase::Searching, SearchPhase::Found)
                | (SearchPhase::Searching, SearchPhase::NoPath)
                | (SearchPhase::Searching, SearchPhase::TimedOut)
        );
        if allowed {
            Ok(next)
        } else {
            Err(SearchError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Which edge attribute a search minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCost {
    /// The weight assigned by the cost model.
    Weight,
    /// Physical length in meters.
    Length,
}

impl EdgeCost {
    pub fn of(self, edge: &Edge) -> f64 {
        match self {
            EdgeCost::Weight => edge.weight,
            EdgeCost::Length => edge.length_m,
        }
    }
}

/// Wall-clock allowance for one search request.
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    budget: Duration,
    deadline: Instant,
}

impl SearchBudget {
    /// Budget starting now.
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            deadline: Instant::now() + budget,
        }
    }

    pub fn is_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub(crate) fn check(&self, pops: usize) -> Result<(), SearchError> {
        if pops % DEADLINE_CHECK_INTERVAL == 0 && self.is_exceeded() {
            return Err(SearchError::Timeout {
                budget: self.budget,
                explored: pops,
            });
        }
        Ok(())
    }
}

/// A route through the network as node and edge index sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    /// Total search cost under the `EdgeCost` it was found with.
    pub cost: f64,
    pub nodes_explored: usize,
}

impl Path {
    pub(crate) fn trivial(node: NodeIndex) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
            cost: 0.0,
            nodes_explored: 1,
        }
    }

    pub fn node_ids(&self, network: &RoadNetwork) -> Vec<String> {
        self.nodes
            .iter()
            .map(|&n| network.node(n).id.clone())
            .collect()
    }

    pub fn edge_ids(&self, network: &RoadNetwork) -> Vec<String> {
        self.edges
            .iter()
            .map(|&e| network.edge(e).id.clone())
            .collect()
    }
}

/// Resolve a node id to its index.
pub fn resolve(network: &RoadNetwork, id: &str) -> Result<NodeIndex, SearchError> {
    network
        .index_of(id)
        .ok_or_else(|| SearchError::UnknownNode(id.to_string()))
}

pub(crate) fn ensure_in_network(network: &RoadNetwork, idx: NodeIndex) -> Result<(), SearchError> {
    if idx < network.node_count() {
        Ok(())
    } else {
        Err(SearchError::UnknownNode(format!("#{idx}")))
    }
}

/// Min-heap entry ordered by priority, ties broken by node index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueEntry {
    pub priority: f64,
    pub node: NodeIndex,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed so `BinaryHeap` pops the cheapest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Walk `prev_edge` back from `to` and return the forward node and edge
/// sequences.
pub(crate) fn reconstruct(
    network: &RoadNetwork,
    prev_edge: &[Option<EdgeIndex>],
    from: NodeIndex,
    to: NodeIndex,
) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
    let mut nodes = vec![to];
    let mut edges = Vec::new();
    let mut current = to;
    while current != from {
        let Some(e) = prev_edge[current] else { break };
        edges.push(e);
        current = network.edge(e).source;
        nodes.push(current);
    }
    nodes.reverse();
    edges.reverse();
    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_phase_transitions() {
        let phase = SearchPhase::Initialized;
        let searching = phase.transition(SearchPhase::Searching).unwrap();
        assert_eq!(searching.transition(SearchPhase::Found), Ok(SearchPhase::Found));
        assert!(SearchPhase::Found.is_terminal());
        assert!(SearchPhase::Initialized
            .transition(SearchPhase::Found)
            .is_err());
        assert!(SearchPhase::TimedOut
            .transition(SearchPhase::Searching)
            .is_err());
    }

    #[test]
    fn test_queue_pops_cheapest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry { priority: 3.0, node: 1 });
        heap.push(QueueEntry { priority: 1.0, node: 2 });
        heap.push(QueueEntry { priority: 2.0, node: 3 });
        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_zero_budget_is_exceeded_immediately() {
        let budget = SearchBudget::new(Duration::ZERO);
        assert!(budget.is_exceeded());
        assert!(matches!(budget.check(0), Err(SearchError::Timeout { .. })));
        // Only every DEADLINE_CHECK_INTERVAL pops is the clock consulted.
        assert!(budget.check(1).is_ok());
    }
}
