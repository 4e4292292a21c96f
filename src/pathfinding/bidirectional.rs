//! Bidirectional Dijkstra.
//!
//! Forward search over outgoing edges from the origin, backward search over
//! incoming edges from the destination. The side with the cheaper frontier
//! advances; the search stops once the two frontier minima together reach
//! the best meeting cost seen so far.

use std::collections::BinaryHeap;

use super::{
    ensure_in_network, reconstruct, EdgeCost, Path, QueueEntry, SearchBudget, SearchError,
    SearchPhase,
};
use crate::network::{EdgeIndex, NodeIndex, RoadNetwork};

struct Side {
    dist: Vec<f64>,
    prev_edge: Vec<Option<EdgeIndex>>,
    settled: Vec<bool>,
    heap: BinaryHeap<QueueEntry>,
}

impl Side {
    fn new(n: usize, start: NodeIndex) -> Self {
        let mut dist = vec![f64::INFINITY; n];
        dist[start] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry {
            priority: 0.0,
            node: start,
        });
        Self {
            dist,
            prev_edge: vec![None; n],
            settled: vec![false; n],
            heap,
        }
    }

    fn top(&self) -> f64 {
        self.heap.peek().map_or(f64::INFINITY, |e| e.priority)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Shortest path from `origin` to `destination` under `cost`, searched from
/// both ends.
pub fn bidirectional_shortest_path(
    network: &RoadNetwork,
    origin: NodeIndex,
    destination: NodeIndex,
    cost: EdgeCost,
    budget: &SearchBudget,
) -> Result<Option<Path>, SearchError> {
    ensure_in_network(network, origin)?;
    ensure_in_network(network, destination)?;

    let mut phase = SearchPhase::Initialized.transition(SearchPhase::Searching)?;
    if origin == destination {
        phase.transition(SearchPhase::Found)?;
        return Ok(Some(Path::trivial(origin)));
    }

    let n = network.node_count();
    let mut forward = Side::new(n, origin);
    let mut backward = Side::new(n, destination);
    let mut best = f64::INFINITY;
    let mut meeting: Option<NodeIndex> = None;
    let mut pops = 0usize;

    loop {
        let (top_f, top_b) = (forward.top(), backward.top());
        if top_f.is_infinite() && top_b.is_infinite() {
            break;
        }
        if top_f + top_b >= best {
            break;
        }

        if let Err(err) = budget.check(pops) {
            phase = phase.transition(SearchPhase::TimedOut)?;
            tracing::debug!(?phase, explored = pops, "bidirectional search timed out");
            return Err(err);
        }
        pops += 1;

        let direction = if top_f <= top_b {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let (this, other) = match direction {
            Direction::Forward => (&mut forward, &backward),
            Direction::Backward => (&mut backward, &forward),
        };

        let Some(QueueEntry { priority, node }) = this.heap.pop() else {
            continue;
        };
        if this.settled[node] || priority > this.dist[node] {
            continue;
        }
        this.settled[node] = true;

        let adjacent = match direction {
            Direction::Forward => network.outgoing(node),
            Direction::Backward => network.incoming(node),
        };
        for &e in adjacent {
            let edge = network.edge(e);
            let next = match direction {
                Direction::Forward => edge.target,
                Direction::Backward => edge.source,
            };
            let tentative = this.dist[node] + cost.of(edge);
            if tentative < this.dist[next] {
                this.dist[next] = tentative;
                this.prev_edge[next] = Some(e);
                this.heap.push(QueueEntry {
                    priority: tentative,
                    node: next,
                });
            }
            let through = this.dist[next] + other.dist[next];
            if through < best {
                best = through;
                meeting = Some(next);
            }
        }
    }

    let Some(meet) = meeting else {
        phase.transition(SearchPhase::NoPath)?;
        return Ok(None);
    };
    phase.transition(SearchPhase::Found)?;

    let (mut nodes, mut edges) = reconstruct(network, &forward.prev_edge, origin, meet);
    let mut current = meet;
    while current != destination {
        let Some(e) = backward.prev_edge[current] else {
            break;
        };
        edges.push(e);
        current = network.edge(e).target;
        nodes.push(current);
    }

    Ok(Some(Path {
        nodes,
        edges,
        cost: best,
        nodes_explored: pops,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EdgeRow, NetworkRows, Node, RoadType};
    use crate::pathfinding::shortest_path;
    use std::time::Duration;

    fn ladder() -> RoadNetwork {
        // Two parallel rails joined by rungs; lengths exceed the geodesic
        // distances between the endpoints.
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for i in 0..6 {
            nodes.push(Node::new(format!("t{i}"), 0.001, i as f64 * 0.001));
            nodes.push(Node::new(format!("b{i}"), 0.0, i as f64 * 0.001));
            edges.push(EdgeRow::new(
                format!("r{i}"),
                format!("t{i}"),
                format!("b{i}"),
                150.0 + i as f64,
                RoadType::Residential,
            ));
            if i > 0 {
                edges.push(EdgeRow::new(
                    format!("top{i}"),
                    format!("t{}", i - 1),
                    format!("t{i}"),
                    130.0,
                    RoadType::Primary,
                ));
                edges.push(EdgeRow::new(
                    format!("bot{i}"),
                    format!("b{}", i - 1),
                    format!("b{i}"),
                    120.0 + (i % 2) as f64 * 30.0,
                    RoadType::Primary,
                ));
            }
        }
        RoadNetwork::from_rows(&NetworkRows { nodes, edges }).unwrap()
    }

    #[test]
    fn test_matches_unidirectional_cost() {
        let network = ladder();
        let budget = SearchBudget::new(Duration::from_secs(5));
        for (from, to) in [("t0", "b5"), ("b0", "t5"), ("t3", "b0"), ("b2", "b4")] {
            let o = network.index_of(from).unwrap();
            let d = network.index_of(to).unwrap();
            let bi = bidirectional_shortest_path(&network, o, d, EdgeCost::Length, &budget)
                .unwrap()
                .unwrap();
            let uni = shortest_path(&network, o, d, EdgeCost::Length, &budget)
                .unwrap()
                .unwrap();
            assert!((bi.cost - uni.cost).abs() < 1e-9, "{from}->{to}");
            assert_eq!(bi.nodes.first(), Some(&o));
            assert_eq!(bi.nodes.last(), Some(&d));
            assert_eq!(bi.nodes.len(), bi.edges.len() + 1);
            let summed: f64 = bi.edges.iter().map(|&e| network.edge(e).length_m).sum();
            assert!((summed - bi.cost).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_path_between_components() {
        let network = RoadNetwork::from_rows(&NetworkRows {
            nodes: vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 0.0, 0.001),
                Node::new("c", 1.0, 1.0),
                Node::new("d", 1.0, 1.001),
            ],
            edges: vec![
                EdgeRow::new("ab", "a", "b", 200.0, RoadType::Primary),
                EdgeRow::new("cd", "c", "d", 200.0, RoadType::Primary),
            ],
        })
        .unwrap();
        let budget = SearchBudget::new(Duration::from_secs(5));
        let a = network.index_of("a").unwrap();
        let d = network.index_of("d").unwrap();
        assert!(bidirectional_shortest_path(&network, a, d, EdgeCost::Length, &budget)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_zero_budget_times_out() {
        let network = ladder();
        let budget = SearchBudget::new(Duration::ZERO);
        let o = network.index_of("t0").unwrap();
        let d = network.index_of("b5").unwrap();
        assert!(matches!(
            bidirectional_shortest_path(&network, o, d, EdgeCost::Length, &budget),
            Err(SearchError::Timeout { .. })
        ));
    }
}
