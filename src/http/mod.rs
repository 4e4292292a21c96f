//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing, timeout, body limit)
//!     → security::require_api_key (X-API-Key → ApiPrincipal)
//!     → handlers.rs (rate limit, optimize, record usage)
//!     → response.rs (error mapping, rate-limit headers)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{OptimizeRouteBody, UsageQuery, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
