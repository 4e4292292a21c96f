//! Multi-criteria edge cost model.
//!
//! # Data Flow
//! ```text
//! Criterion (+ optional time factor)
//!     → criterion.rs (CriterionWeights)
//!     → model.rs (edge_weight per edge, apply_weights over a network)
//!     → weighted RoadNetwork consumed by pathfinding
//! ```
//!
//! # Design Decisions
//! - Edge weights are a pure function of the edge and the weights
//! - Flat per-km cost and emission constants live here and are reused by
//!   path metrics and vehicle pricing

pub mod criterion;
pub mod model;

use thiserror::Error;

pub use criterion::{Criterion, CriterionWeights};
pub use model::{apply_weights, edge_weight, road_type_multiplier};

/// Flat fuel cost per kilometer used for edge weights and path metrics.
pub const DEFAULT_COST_PER_KM: f64 = 0.15;
/// Flat CO2 emissions per kilometer used for edge weights and path metrics.
pub const DEFAULT_EMISSIONS_PER_KM: f64 = 0.12;

#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    #[error("time factor must be a finite number greater than zero, got {0}")]
    InvalidFactor(f64),
}
