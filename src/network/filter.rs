//! Vehicle-constraint filtering.
//!
//! # Responsibilities
//! - Remove edges a vehicle may not use (road class, preferences, tags)
//! - Re-weight networks toward major roads for heavy vehicles
//! - Validate an already computed path against a vehicle
//!
//! # Design Decisions
//! - Road-class access is a static `match` per vehicle class
//! - Unknown road types are never accessible

use std::collections::BTreeSet;

use serde::Serialize;

use super::graph::{Edge, NodeIndex, RoadNetwork, RoadType};
use crate::vehicle::{VehicleClass, VehicleProfile};

/// Weight multiplier applied to major roads for heavy vehicles.
pub const HEAVY_MAJOR_ROAD_FACTOR: f64 = 0.9;
/// Weight multiplier applied to every other road for heavy vehicles.
pub const HEAVY_MINOR_ROAD_FACTOR: f64 = 1.3;

/// Outcome of checking a node sequence against a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValidation {
    pub valid: bool,
    pub reason: String,
}

impl PathValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: "route is valid for vehicle".to_string(),
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason,
        }
    }
}

/// Namespace for vehicle-aware network transformations.
pub struct VehicleConstraintFilter;

impl VehicleConstraintFilter {
    /// Whether `class` may use roads of `road_type` at all.
    pub fn road_type_allowed(class: VehicleClass, road_type: RoadType) -> bool {
        use RoadType::*;
        match class {
            VehicleClass::Car | VehicleClass::Motorcycle | VehicleClass::ElectricCar => matches!(
                road_type,
                Motorway | Trunk | Primary | Secondary | Tertiary | Residential | Service
            ),
            VehicleClass::Truck | VehicleClass::ElectricTruck => {
                matches!(road_type, Motorway | Trunk | Primary | Secondary | Tertiary)
            }
            VehicleClass::Van => matches!(
                road_type,
                Motorway | Trunk | Primary | Secondary | Tertiary | Residential
            ),
            VehicleClass::Bicycle => {
                matches!(road_type, Cycleway | Path | Residential | Service | Tertiary)
            }
        }
    }

    /// Whether `vehicle` may drive along `edge`.
    pub fn edge_allowed(edge: &Edge, vehicle: &VehicleProfile) -> bool {
        Self::road_type_allowed(vehicle.vehicle_class, edge.road_type)
            && !(vehicle.avoid_highways && edge.road_type.is_highway())
            && edge.restrictions().allows(vehicle)
    }

    /// Copy of `network` without the edges `vehicle` cannot use.
    ///
    /// Nodes left without any incident edge are dropped.
    pub fn filter(network: &RoadNetwork, vehicle: &VehicleProfile) -> RoadNetwork {
        let filtered = network.retain_edges(|edge| Self::edge_allowed(edge, vehicle));
        tracing::debug!(
            vehicle = %vehicle.vehicle_class,
            nodes_before = network.node_count(),
            nodes_after = filtered.node_count(),
            edges_before = network.edge_count(),
            edges_after = filtered.edge_count(),
            "Filtered network for vehicle"
        );
        filtered
    }

    /// Bias a weighted network toward major roads for heavy vehicles.
    ///
    /// Networks for other vehicles are returned unchanged.
    pub fn prioritize(network: RoadNetwork, vehicle: &VehicleProfile) -> RoadNetwork {
        if !vehicle.requires_heavy_vehicle_routing() {
            return network;
        }
        network.map_weights(|edge| {
            let factor = match edge.road_type {
                RoadType::Motorway | RoadType::Trunk | RoadType::Primary => {
                    HEAVY_MAJOR_ROAD_FACTOR
                }
                _ => HEAVY_MINOR_ROAD_FACTOR,
            };
            edge.weight * factor
        })
    }

    /// Check each hop of `path` for an edge `vehicle` may use.
    pub fn validate(
        network: &RoadNetwork,
        path: &[NodeIndex],
        vehicle: &VehicleProfile,
    ) -> PathValidation {
        for hop in path.windows(2) {
            let (from, to) = (hop[0], hop[1]);
            let mut candidates = network.edges_between(from, to).peekable();
            let Some(first) = candidates.peek().copied() else {
                return PathValidation::rejected(format!(
                    "no road between {} and {}",
                    network.node(from).id,
                    network.node(to).id
                ));
            };

            let usable = candidates.any(|edge| Self::edge_allowed(edge, vehicle));
            if !usable {
                let why = match first.restrictions().violation(vehicle) {
                    Some(why) => why,
                    None if vehicle.avoid_highways && first.road_type.is_highway() => {
                        "highway avoided"
                    }
                    None => "road class not permitted",
                };
                return PathValidation::rejected(format!(
                    "{} is not usable by {}: {why}",
                    first.label(),
                    vehicle.vehicle_class
                ));
            }
        }
        PathValidation::ok()
    }

    /// Ids of nodes reachable by at least one edge the vehicle may use.
    pub fn accessible_nodes(network: &RoadNetwork, vehicle: &VehicleProfile) -> BTreeSet<String> {
        Self::filter(network, vehicle)
            .nodes()
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }
}
