//! Optimization engine subsystem.
//!
//! # Data Flow
//! ```text
//! OptimizationRequest
//!     → request.rs (validation, criterion weights)
//!     → optimizer.rs
//!         → RouteCache hit? return
//!         → GraphCache / NetworkProvider (retry + timeout)
//!         → filter → weights → heavy-vehicle priority
//!         → blocking pool: snap endpoints, baseline, primary, alternatives
//!     → pricing.rs (per-vehicle cost and emission rates)
//!     → response.rs (OptimizationResponse)
//! ```
//!
//! # Design Decisions
//! - Providers and caches are injected; the engine owns no globals
//! - Graph work never runs on the async executor
//! - The external geometry provider is a fallback for provider outages only

pub mod optimizer;
pub mod pricing;
pub mod request;
pub mod response;

pub use optimizer::{EngineCacheStats, EngineSettings, OptimizationEngine};
pub use pricing::{rates_for, VehicleRates};
pub use request::{OptimizationRequest, VehicleSpec, DEFAULT_ALTERNATIVES};
pub use response::{
    Improvements, OptimizationResponse, ResponseMetadata, RouteAlgorithm, RouteResult,
    RoutingSource,
};
