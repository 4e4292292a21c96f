//! Request bodies and request identity.
//!
//! # Design Decisions
//! - Request IDs are assigned by tower-http before tracing starts, so every
//!   span and response carries one
//! - The wire body takes a vehicle spec (class + overrides), not a full profile

use axum::http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};

use crate::cost::Criterion;
use crate::engine::{OptimizationRequest, VehicleSpec, DEFAULT_ALTERNATIVES};
use crate::network::Coordinate;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID assigned to this request, or "-" when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn default_alternatives() -> usize {
    DEFAULT_ALTERNATIVES
}

/// `POST /v1/optimize-route` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRouteBody {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub vehicle: VehicleSpec,
    #[serde(default)]
    pub criterion: Criterion,
    #[serde(default = "default_alternatives")]
    pub alternatives: usize,
    #[serde(default)]
    pub factor: Option<f64>,
}

impl OptimizeRouteBody {
    pub fn into_request(self) -> OptimizationRequest {
        OptimizationRequest {
            origin: self.origin,
            destination: self.destination,
            vehicle: self.vehicle.into_profile(),
            criterion: self.criterion,
            alternatives: self.alternatives,
            factor: self.factor,
        }
    }
}

pub const DEFAULT_USAGE_HOURS: u64 = 24;
pub const MAX_USAGE_HOURS: u64 = 24 * 30;

/// `GET /v1/usage` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageQuery {
    pub hours: Option<u64>,
}

impl UsageQuery {
    pub fn hours(&self) -> u64 {
        self.hours
            .unwrap_or(DEFAULT_USAGE_HOURS)
            .clamp(1, MAX_USAGE_HOURS)
    }
}
