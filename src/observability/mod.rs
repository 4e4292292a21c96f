//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, caches, rate limiter, HTTP layer produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and histograms through the `metrics` facade)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request IDs come from the HTTP layer and ride along on request spans
//! - Recording a metric with no exporter installed is a no-op

pub mod logging;
pub mod metrics;
