//! Per-vehicle operating cost and emission rates.

use serde::Serialize;

use crate::cost::{DEFAULT_COST_PER_KM, DEFAULT_EMISSIONS_PER_KM};
use crate::vehicle::VehicleClass;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleRates {
    pub cost_per_km: f64,
    pub emissions_per_km: f64,
}

impl VehicleRates {
    pub const DEFAULT: VehicleRates = VehicleRates {
        cost_per_km: DEFAULT_COST_PER_KM,
        emissions_per_km: DEFAULT_EMISSIONS_PER_KM,
    };
}

/// Pricing used when reporting route cost and emissions.
pub fn rates_for(class: VehicleClass) -> VehicleRates {
    let (cost_per_km, emissions_per_km) = match class {
        VehicleClass::Car => (0.15, 0.12),
        VehicleClass::Truck => (0.35, 0.25),
        VehicleClass::Van => (0.25, 0.18),
        VehicleClass::Motorcycle => (0.08, 0.08),
        VehicleClass::Bicycle => (0.0, 0.0),
        VehicleClass::ElectricCar => (0.05, 0.03),
        _ => return VehicleRates::DEFAULT,
    };
    VehicleRates {
        cost_per_km,
        emissions_per_km,
    }
}
