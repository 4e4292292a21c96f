//! Vehicle modelling subsystem.
//!
//! # Data Flow
//! ```text
//! Request vehicle spec
//!     → profile.rs (preset + overrides, validated VehicleProfile)
//!     → restrictions.rs (per-edge RoadRestrictions parsed from tags)
//!     → RoadRestrictions::allows(profile) consulted by the network filter
//! ```
//!
//! # Design Decisions
//! - Profiles are immutable values; presets are plain constructors
//! - Missing limits and missing vehicle attributes never block an edge
//! - Heavy-vehicle thresholds are strict inequalities

pub mod profile;
pub mod restrictions;

use thiserror::Error;

pub use profile::{FuelClass, VehicleClass, VehicleProfile};
pub use restrictions::RoadRestrictions;

/// Errors raised while validating a vehicle profile.
#[derive(Debug, Error, PartialEq)]
pub enum VehicleError {
    #[error("invalid vehicle profile: {0}")]
    InvalidProfile(String),
}
