//! Road network subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkRows (provider)
//!     → graph.rs (RoadNetwork::from_rows, two-way rows split into two edges)
//!     → filter.rs (vehicle-constraint filtering → new RoadNetwork)
//!     → cost model assigns weights (new RoadNetwork)
//!     → pathfinding reads the network immutably
//! ```
//!
//! # Design Decisions
//! - Directed multigraph: parallel edges between the same nodes are kept
//! - Every transformation returns a new network; inputs are never mutated
//! - Networks are shared read-only behind `Arc` once built

pub mod filter;
pub mod geo;
pub mod graph;

use thiserror::Error;

pub use filter::{PathValidation, VehicleConstraintFilter};
pub use geo::{BoundingBox, Coordinate};
pub use graph::{Edge, EdgeIndex, EdgeRow, NetworkRows, Node, NodeIndex, RoadNetwork, RoadType};

/// Errors raised while building a network from external rows.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: String, node: String },

    #[error("edge {edge} is malformed: {reason}")]
    InvalidEdge { edge: String, reason: String },

    #[error("node {node} has invalid coordinates")]
    InvalidNode { node: String },
}
