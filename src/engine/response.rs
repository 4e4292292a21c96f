//! Optimization results.

use serde::{Deserialize, Serialize};

use crate::cache::SizeEstimate;
use crate::cost::Criterion;
use crate::network::Coordinate;
use crate::pathfinding::metrics::round_to;
use crate::pathfinding::PathMetrics;
use crate::vehicle::VehicleClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAlgorithm {
    Astar,
    BidirectionalDijkstra,
    AstarAlternative,
    External,
    ExternalAlternative,
}

impl RouteAlgorithm {
    /// Fixed confidence reported for routes produced by this algorithm.
    pub fn confidence(self) -> f64 {
        match self {
            RouteAlgorithm::Astar => 0.95,
            RouteAlgorithm::BidirectionalDijkstra => 0.98,
            RouteAlgorithm::External => 0.98,
            RouteAlgorithm::AstarAlternative | RouteAlgorithm::ExternalAlternative => 0.90,
        }
    }
}

/// One route with rounded metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub coordinates: Vec<Coordinate>,
    pub node_ids: Vec<String>,
    pub edge_ids: Vec<String>,
    #[serde(flatten)]
    pub metrics: PathMetrics,
    pub confidence: f64,
    pub algorithm: RouteAlgorithm,
    pub processing_time_ms: u64,
}

/// How much the primary route saves over the baseline. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvements {
    pub distance_saved_km: f64,
    pub time_saved_minutes: f64,
    pub cost_saved_usd: f64,
    pub emissions_saved_kg: f64,
}

impl Improvements {
    pub fn between(baseline: &PathMetrics, primary: &PathMetrics) -> Self {
        let saved = |b: f64, p: f64, decimals: i32| round_to((b - p).max(0.0), decimals);
        Self {
            distance_saved_km: saved(baseline.distance_km, primary.distance_km, 2),
            time_saved_minutes: saved(baseline.time_minutes, primary.time_minutes, 1),
            cost_saved_usd: saved(baseline.cost_usd, primary.cost_usd, 2),
            emissions_saved_kg: saved(baseline.emissions_kg, primary.emissions_kg, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingSource {
    InternalGraph,
    ExternalGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_explored: usize,
    pub criterion: Criterion,
    pub vehicle_class: VehicleClass,
    pub routing_source: RoutingSource,
    pub cached: bool,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub primary: RouteResult,
    pub baseline: RouteResult,
    pub alternatives: Vec<RouteResult>,
    pub improvements: Improvements,
    pub metadata: ResponseMetadata,
}

impl SizeEstimate for OptimizationResponse {
    fn estimated_size_bytes(&self) -> usize {
        let route = |r: &RouteResult| {
            std::mem::size_of::<RouteResult>()
                + r.coordinates.len() * std::mem::size_of::<Coordinate>()
                + r.node_ids.iter().chain(&r.edge_ids).map(|s| s.len() + 24).sum::<usize>()
        };
        std::mem::size_of::<Self>()
            + route(&self.primary)
            + route(&self.baseline)
            + self.alternatives.iter().map(route).sum::<usize>()
    }
}
