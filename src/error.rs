//! Errors surfaced by the optimization engine.
//!
//! Algorithmic layers keep their own narrow error types; this module folds
//! them into the outcome categories callers act on. "No route" is a normal
//! answer about the road network and stays separate from system failures.

use std::time::Duration;
use thiserror::Error;

use crate::cost::CostError;
use crate::network::NetworkError;
use crate::pathfinding::SearchError;
use crate::vehicle::VehicleError;

/// Failure categories of a route optimization.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The request or vehicle profile is contradictory or incomplete.
    #[error("invalid request: {0}")]
    Configuration(String),

    /// The network contains no usable path for this vehicle.
    #[error("no route found: {0}")]
    NoRouteFound(String),

    /// An endpoint could not be mapped onto the road network.
    #[error("invalid endpoints: {0}")]
    InvalidEndpoints(String),

    /// The search exceeded its time budget.
    #[error("route search exceeded its {0:?} budget")]
    Timeout(Duration),

    /// Network data or external routing could not be reached.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed graph data or a failed worker task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OptimizeError {
    /// Stable label used for metrics and JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::Configuration(_) => "configuration_error",
            OptimizeError::NoRouteFound(_) => "no_route_found",
            OptimizeError::InvalidEndpoints(_) => "invalid_endpoints",
            OptimizeError::Timeout(_) => "timeout",
            OptimizeError::UpstreamUnavailable(_) => "upstream_unavailable",
            OptimizeError::Internal(_) => "internal_error",
        }
    }
}

impl From<VehicleError> for OptimizeError {
    fn from(err: VehicleError) -> Self {
        OptimizeError::Configuration(err.to_string())
    }
}

impl From<CostError> for OptimizeError {
    fn from(err: CostError) -> Self {
        OptimizeError::Configuration(err.to_string())
    }
}

impl From<NetworkError> for OptimizeError {
    fn from(err: NetworkError) -> Self {
        OptimizeError::Internal(err.to_string())
    }
}

impl From<SearchError> for OptimizeError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Timeout { budget, .. } => OptimizeError::Timeout(budget),
            SearchError::UnknownNode(id) => {
                OptimizeError::InvalidEndpoints(format!("node {id} is not in the network"))
            }
            SearchError::InvalidTransition { .. } => OptimizeError::Internal(err.to_string()),
        }
    }
}
