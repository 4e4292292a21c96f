//! Optimization requests.

use serde::{Deserialize, Serialize};

use crate::cost::{Criterion, CriterionWeights};
use crate::error::OptimizeError;
use crate::network::Coordinate;
use crate::vehicle::{FuelClass, VehicleClass, VehicleProfile};

pub const DEFAULT_ALTERNATIVES: usize = 2;

fn default_alternatives() -> usize {
    DEFAULT_ALTERNATIVES
}

/// A fully resolved request handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub vehicle: VehicleProfile,
    #[serde(default)]
    pub criterion: Criterion,
    #[serde(default = "default_alternatives")]
    pub alternatives: usize,
    /// Time-preference factor; below 1 favours faster routes.
    #[serde(default)]
    pub factor: Option<f64>,
}

impl OptimizationRequest {
    pub fn new(origin: Coordinate, destination: Coordinate, vehicle: VehicleProfile) -> Self {
        Self {
            origin,
            destination,
            vehicle,
            criterion: Criterion::default(),
            alternatives: DEFAULT_ALTERNATIVES,
            factor: None,
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_alternatives(mut self, alternatives: usize) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor.unwrap_or(1.0)
    }

    /// Check coordinates, vehicle and factor.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        for (name, c) in [("origin", self.origin), ("destination", self.destination)] {
            if !c.is_valid() {
                return Err(OptimizeError::Configuration(format!(
                    "{name} ({}, {}) is outside lat ±90 / lng ±180",
                    c.lat, c.lng
                )));
            }
        }
        self.vehicle.validate()?;
        self.weights()?;
        Ok(())
    }

    /// Criterion weights adjusted by the time factor.
    pub fn weights(&self) -> Result<CriterionWeights, OptimizeError> {
        Ok(self.criterion.weights().with_time_factor(self.factor())?)
    }
}

/// Vehicle description accepted from clients: a class preset with optional
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSpec {
    pub vehicle_class: Option<VehicleClass>,
    pub fuel_class: Option<FuelClass>,
    pub height_m: Option<f64>,
    pub width_m: Option<f64>,
    pub length_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub max_speed_kmh: Option<f64>,
    pub average_speed_kmh: Option<f64>,
    pub avoid_highways: Option<bool>,
    pub avoid_tolls: Option<bool>,
    pub avoid_ferries: Option<bool>,
    pub avoid_unpaved: Option<bool>,
    pub hazmat: Option<bool>,
}

impl VehicleSpec {
    pub fn class(vehicle_class: VehicleClass) -> Self {
        Self {
            vehicle_class: Some(vehicle_class),
            ..Self::default()
        }
    }

    /// Start from the class preset (car when absent) and apply overrides.
    pub fn into_profile(self) -> VehicleProfile {
        let mut p = VehicleProfile::preset(self.vehicle_class.unwrap_or(VehicleClass::Car));
        if let Some(fuel) = self.fuel_class {
            p.fuel_class = fuel;
        }
        p.height_m = self.height_m.or(p.height_m);
        p.width_m = self.width_m.or(p.width_m);
        p.length_m = self.length_m.or(p.length_m);
        p.weight_kg = self.weight_kg.or(p.weight_kg);
        p.max_speed_kmh = self.max_speed_kmh.or(p.max_speed_kmh);
        if let Some(avg) = self.average_speed_kmh {
            p.average_speed_kmh = avg;
        }
        p.avoid_highways = self.avoid_highways.unwrap_or(p.avoid_highways);
        p.avoid_tolls = self.avoid_tolls.unwrap_or(p.avoid_tolls);
        p.avoid_ferries = self.avoid_ferries.unwrap_or(p.avoid_ferries);
        p.avoid_unpaved = self.avoid_unpaved.unwrap_or(p.avoid_unpaved);
        p.hazmat = self.hazmat.unwrap_or(p.hazmat);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OptimizationRequest {
        OptimizationRequest::new(
            Coordinate::new(52.52, 13.40),
            Coordinate::new(52.50, 13.45),
            VehicleProfile::car(),
        )
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let mut r = request();
        r.destination.lat = 91.0;
        assert!(matches!(r.validate(), Err(OptimizeError::Configuration(_))));
    }

    #[test]
    fn test_bad_factor() {
        let r = request().with_factor(0.0);
        assert!(matches!(r.validate(), Err(OptimizeError::Configuration(_))));
    }

    #[test]
    fn test_defaults_from_json() {
        let r: OptimizationRequest = serde_json::from_str(
            r#"{"origin":{"lat":1.0,"lng":2.0},"destination":{"lat":1.1,"lng":2.1},"criterion":"unheard_of"}"#,
        )
        .unwrap();
        assert_eq!(r.criterion, Criterion::Balanced);
        assert_eq!(r.alternatives, DEFAULT_ALTERNATIVES);
        assert_eq!(r.vehicle, VehicleProfile::car());
        assert_eq!(r.factor(), 1.0);
    }

    #[test]
    fn test_vehicle_spec_overrides_preset() {
        let spec: VehicleSpec = serde_json::from_str(
            r#"{"vehicle_class":"truck","height_m":3.2,"avoid_tolls":true}"#,
        )
        .unwrap();
        let profile = spec.into_profile();
        assert_eq!(profile.vehicle_class, VehicleClass::Truck);
        assert_eq!(profile.height_m, Some(3.2));
        assert_eq!(profile.weight_kg, Some(18_000.0));
        assert!(profile.avoid_tolls);
        assert_eq!(VehicleSpec::default().into_profile(), VehicleProfile::car());
    }
}
