//! A* search with a great-circle heuristic.
//!
//! The heuristic is the geodesic distance to the destination multiplied by
//! the cheapest cost per kilometer of edge length found in the network. It
//! never overestimates as long as every edge is at least as long as the
//! straight line between its endpoints, which holds for surveyed road data.

use std::collections::{BinaryHeap, HashSet};

use super::{
    ensure_in_network, reconstruct, EdgeCost, Path, QueueEntry, SearchBudget, SearchError,
    SearchPhase,
};
use crate::network::{EdgeIndex, NodeIndex, RoadNetwork};

/// Cheapest search cost per kilometer of edge length.
fn heuristic_scale(network: &RoadNetwork, cost: EdgeCost, banned: &HashSet<EdgeIndex>) -> f64 {
    let scale = network
        .edges()
        .iter()
        .enumerate()
        .filter(|(idx, e)| e.length_m > 0.0 && !banned.contains(idx))
        .map(|(_, e)| cost.of(e) / e.length_km())
        .fold(f64::INFINITY, f64::min);
    if scale.is_finite() {
        scale.max(0.0)
    } else {
        0.0
    }
}

/// Shortest path from `origin` to `destination` under `cost`.
pub fn shortest_path(
    network: &RoadNetwork,
    origin: NodeIndex,
    destination: NodeIndex,
    cost: EdgeCost,
    budget: &SearchBudget,
) -> Result<Option<Path>, SearchError> {
    shortest_path_avoiding(network, origin, destination, cost, budget, &HashSet::new())
}

/// A* that treats every edge in `banned` as absent.
pub(crate) fn shortest_path_avoiding(
    network: &RoadNetwork,
    origin: NodeIndex,
    destination: NodeIndex,
    cost: EdgeCost,
    budget: &SearchBudget,
    banned: &HashSet<EdgeIndex>,
) -> Result<Option<Path>, SearchError> {
    ensure_in_network(network, origin)?;
    ensure_in_network(network, destination)?;

    let mut phase = SearchPhase::Initialized.transition(SearchPhase::Searching)?;
    if origin == destination {
        phase.transition(SearchPhase::Found)?;
        return Ok(Some(Path::trivial(origin)));
    }

    let scale = heuristic_scale(network, cost, banned);
    let h = |n: NodeIndex| network.geodesic_km(n, destination) * scale;

    let n = network.node_count();
    let mut g = vec![f64::INFINITY; n];
    let mut prev_edge: Vec<Option<EdgeIndex>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut heap = BinaryHeap::new();

    g[origin] = 0.0;
    heap.push(QueueEntry {
        priority: h(origin),
        node: origin,
    });

    let mut pops = 0usize;
    while let Some(QueueEntry { node, .. }) = heap.pop() {
        if let Err(err) = budget.check(pops) {
            phase = phase.transition(SearchPhase::TimedOut)?;
            tracing::debug!(?phase, explored = pops, "A* search timed out");
            return Err(err);
        }
        pops += 1;

        if closed[node] {
            continue;
        }
        closed[node] = true;

        if node == destination {
            phase.transition(SearchPhase::Found)?;
            let (nodes, edges) = reconstruct(network, &prev_edge, origin, destination);
            return Ok(Some(Path {
                nodes,
                edges,
                cost: g[destination],
                nodes_explored: pops,
            }));
        }

        for &e in network.outgoing(node) {
            if banned.contains(&e) {
                continue;
            }
            let edge = network.edge(e);
            let next = edge.target;
            if closed[next] {
                continue;
            }
            let tentative = g[node] + cost.of(edge);
            if tentative < g[next] {
                g[next] = tentative;
                prev_edge[next] = Some(e);
                heap.push(QueueEntry {
                    priority: tentative + h(next),
                    node: next,
                });
            }
        }
    }

    phase.transition(SearchPhase::NoPath)?;
    Ok(None)
}
