//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a network provider, usage store or external router:
//!     → timeouts.rs (every call gets a deadline)
//!     → On failure: retries.rs (bounded attempts)
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every I/O call has a deadline
//! - Retries wrap I/O at the orchestrator boundary only, never the
//!   CPU-bound search
//! - Timeout errors stay distinct from other failures

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{retry_with_backoff, RetryPolicy};
pub use timeouts::{with_timeout, TimedOut};
