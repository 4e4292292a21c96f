//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (X-API-Key → ApiPrincipal)
//!     → rate_limit.rs (tier quota via tiers.rs, state in usage_store.rs)
//!     → handler
//!     → rate_limit.rs (usage recorded after the response is built)
//! ```
//!
//! # Design Decisions
//! - Authentication fails closed: unknown keys are rejected
//! - Rate limiting fails open: a broken usage store never blocks traffic
//! - No trust in client input

pub mod access_control;
pub mod rate_limit;
pub mod tiers;
pub mod usage_store;

pub use access_control::{require_api_key, ApiKeyRegistry, ApiPrincipal, API_KEY_HEADER};
pub use rate_limit::{RateLimitResult, RateLimiter, UsageCounts, UsageSummary};
pub use tiers::{Strategy, TierTable};
pub use usage_store::{InMemoryUsageStore, StoreError, UsageRecord, UsageStore};
