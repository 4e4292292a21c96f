//! Route optimization engine library.

// Domain core
pub mod cost;
pub mod engine;
pub mod error;
pub mod network;
pub mod pathfinding;
pub mod vehicle;

// Data sources and caching
pub mod cache;
pub mod provider;

// Service surface
pub mod config;
pub mod http;
pub mod security;

// Cross-cutting concerns
pub mod clock;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use engine::{OptimizationEngine, OptimizationRequest, OptimizationResponse};
pub use error::OptimizeError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
