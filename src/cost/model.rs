//! Edge weight computation.

use super::{CriterionWeights, DEFAULT_COST_PER_KM, DEFAULT_EMISSIONS_PER_KM};
use crate::network::{Edge, RoadNetwork, RoadType};

/// Penalty applied to an edge weight by road class.
pub fn road_type_multiplier(road_type: RoadType) -> f64 {
    match road_type {
        RoadType::Motorway => 1.0,
        RoadType::Trunk => 1.1,
        RoadType::Primary => 1.2,
        RoadType::Secondary => 1.3,
        RoadType::Tertiary => 1.4,
        RoadType::Residential => 1.5,
        RoadType::Service => 1.6,
        _ => 1.3,
    }
}

/// Weighted cost of traversing `edge`.
///
/// Blends length in km, travel time in minutes, fuel cost and emissions,
/// then applies the road class penalty.
pub fn edge_weight(edge: &Edge, weights: &CriterionWeights) -> f64 {
    let km = edge.length_km();
    let minutes = edge.travel_time_minutes();
    let fuel = km * DEFAULT_COST_PER_KM;
    let emissions = km * DEFAULT_EMISSIONS_PER_KM;

    let blended = km * weights.distance
        + minutes * weights.time
        + fuel * weights.cost
        + emissions * weights.emissions;
    blended * road_type_multiplier(edge.road_type)
}

/// Copy of `network` with every edge weight set from `weights`.
pub fn apply_weights(network: &RoadNetwork, weights: &CriterionWeights) -> RoadNetwork {
    network.map_weights(|edge| edge_weight(edge, weights))
}
