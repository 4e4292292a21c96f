//! Alternative routes by progressive edge removal.
//!
//! For the i-th alternative the first i+1 edges of the primary route are
//! removed (cumulatively) and the search is repeated. Only routes whose node
//! sequence differs from every route found so far are kept. This is a cheap
//! heuristic and not a k-shortest-paths enumeration.

use std::collections::HashSet;

use super::astar::shortest_path_avoiding;
use super::{EdgeCost, Path, SearchBudget, SearchError};
use crate::network::{EdgeIndex, RoadNetwork};

/// Up to `count` alternatives to `primary`.
pub fn alternative_routes(
    network: &RoadNetwork,
    primary: &Path,
    cost: EdgeCost,
    count: usize,
    budget: &SearchBudget,
) -> Result<Vec<Path>, SearchError> {
    let (Some(&origin), Some(&destination)) = (primary.nodes.first(), primary.nodes.last()) else {
        return Ok(Vec::new());
    };

    let mut banned: HashSet<EdgeIndex> = HashSet::new();
    let mut seen: Vec<Vec<usize>> = vec![primary.nodes.clone()];
    let mut alternatives = Vec::new();

    for &edge in primary.edges.iter().take(count) {
        banned.insert(edge);
        let Some(candidate) =
            shortest_path_avoiding(network, origin, destination, cost, budget, &banned)?
        else {
            // Removing more edges can only disconnect further.
            break;
        };
        if seen.iter().all(|nodes| *nodes != candidate.nodes) {
            seen.push(candidate.nodes.clone());
            alternatives.push(candidate);
        }
    }

    tracing::debug!(
        requested = count,
        found = alternatives.len(),
        "Generated alternative routes"
    );
    Ok(alternatives)
}
