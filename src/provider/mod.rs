//! External data sources consumed by the engine.
//!
//! # Data Flow
//! ```text
//! OptimizationEngine
//!     → NetworkProvider::load_region(bbox)      (static_network.rs)
//!     → RouteGeometryProvider::routes(o, d, v)  (osrm.rs, fallback only)
//! ```
//!
//! # Design Decisions
//! - Providers are async traits so remote implementations can be swapped in
//! - Providers return raw rows; graph construction stays in the engine
//! - Timeouts and retries are applied by the caller, not the provider

pub mod osrm;
pub mod static_network;

use async_trait::async_trait;
use thiserror::Error;

use crate::network::{BoundingBox, Coordinate, NetworkRows};
use crate::vehicle::VehicleProfile;

pub use osrm::OsrmClient;
pub use static_network::StaticNetworkProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network data unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("route service error: {0}")]
    Upstream(String),
}

/// Source of road network rows for a region.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn load_region(&self, bbox: &BoundingBox) -> Result<NetworkRows, ProviderError>;
}

/// A route computed by an external routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRoute {
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Source of ready-made route geometry, used when no graph is available.
#[async_trait]
pub trait RouteGeometryProvider: Send + Sync {
    /// Routes between the endpoints, best first as ranked by the service.
    async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        vehicle: &VehicleProfile,
        alternatives: bool,
    ) -> Result<Vec<ExternalRoute>, ProviderError>;
}
