//! Physical metrics of a path.

use serde::{Deserialize, Serialize};

use super::Path;
use crate::cost::{DEFAULT_COST_PER_KM, DEFAULT_EMISSIONS_PER_KM};
use crate::network::RoadNetwork;

/// Totals for a path: kilometers, minutes, currency and kg of CO2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathMetrics {
    pub distance_km: f64,
    pub time_minutes: f64,
    pub cost_usd: f64,
    pub emissions_kg: f64,
}

impl PathMetrics {
    /// Metrics using the flat per-km cost and emission rates.
    pub fn from_path(network: &RoadNetwork, path: &Path) -> Self {
        Self::from_path_with_rates(network, path, DEFAULT_COST_PER_KM, DEFAULT_EMISSIONS_PER_KM)
    }

    /// Metrics using explicit per-km rates.
    pub fn from_path_with_rates(
        network: &RoadNetwork,
        path: &Path,
        cost_per_km: f64,
        emissions_per_km: f64,
    ) -> Self {
        let (distance_km, time_minutes) = path.edges.iter().fold((0.0, 0.0), |(d, t), &e| {
            let edge = network.edge(e);
            (d + edge.length_km(), t + edge.travel_time_minutes())
        });
        Self::from_totals(distance_km, time_minutes, cost_per_km, emissions_per_km)
    }

    /// Metrics from a known distance and duration.
    pub fn from_totals(
        distance_km: f64,
        time_minutes: f64,
        cost_per_km: f64,
        emissions_per_km: f64,
    ) -> Self {
        Self {
            distance_km,
            time_minutes,
            cost_usd: distance_km * cost_per_km,
            emissions_kg: distance_km * emissions_per_km,
        }
    }

    /// Rounded for presentation: 2 decimals, minutes to 1 decimal.
    pub fn rounded(self) -> Self {
        Self {
            distance_km: round_to(self.distance_km, 2),
            time_minutes: round_to(self.time_minutes, 1),
            cost_usd: round_to(self.cost_usd, 2),
            emissions_kg: round_to(self.emissions_kg, 2),
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EdgeRow, NetworkRows, Node, RoadType};

    #[test]
    fn test_metrics_sum_edges() {
        let network = RoadNetwork::from_rows(&NetworkRows {
            nodes: vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 0.0, 0.05),
                Node::new("c", 0.0, 0.1),
            ],
            edges: vec![
                EdgeRow::new("ab", "a", "b", 6_000.0, RoadType::Primary)
                    .with_speed(60.0)
                    .one_way(),
                EdgeRow::new("bc", "b", "c", 4_000.0, RoadType::Primary)
                    .with_speed(40.0)
                    .one_way(),
            ],
        })
        .unwrap();
        let path = Path {
            nodes: vec![0, 1, 2],
            edges: vec![0, 1],
            cost: 0.0,
            nodes_explored: 3,
        };
        let m = PathMetrics::from_path(&network, &path);
        assert!((m.distance_km - 10.0).abs() < 1e-12);
        assert!((m.time_minutes - 12.0).abs() < 1e-12);
        assert!((m.cost_usd - 1.5).abs() < 1e-12);
        assert!((m.emissions_kg - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_rounding() {
        let m = PathMetrics {
            distance_km: 1.23456,
            time_minutes: 7.891,
            cost_usd: 0.185,
            emissions_kg: 0.0049,
        }
        .rounded();
        assert_eq!(m.distance_km, 1.23);
        assert_eq!(m.time_minutes, 7.9);
        assert_eq!(m.emissions_kg, 0.0);
    }
}
