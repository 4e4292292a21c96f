//! Vehicle profiles and presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::VehicleError;

/// Weight above which a vehicle is routed as heavy traffic.
pub const HEAVY_WEIGHT_KG: f64 = 7500.0;
/// Height above which a vehicle is routed as heavy traffic.
pub const HEAVY_HEIGHT_M: f64 = 3.5;
/// Length above which a vehicle is routed as heavy traffic.
pub const HEAVY_LENGTH_M: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Truck,
    Van,
    Motorcycle,
    Bicycle,
    ElectricCar,
    ElectricTruck,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 7] = [
        VehicleClass::Car,
        VehicleClass::Truck,
        VehicleClass::Van,
        VehicleClass::Motorcycle,
        VehicleClass::Bicycle,
        VehicleClass::ElectricCar,
        VehicleClass::ElectricTruck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
            VehicleClass::Van => "van",
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Bicycle => "bicycle",
            VehicleClass::ElectricCar => "electric_car",
            VehicleClass::ElectricTruck => "electric_truck",
        }
    }

    pub fn is_truck_like(self) -> bool {
        matches!(self, VehicleClass::Truck | VehicleClass::ElectricTruck)
    }

    pub fn is_electric(self) -> bool {
        matches!(self, VehicleClass::ElectricCar | VehicleClass::ElectricTruck)
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VehicleError::InvalidProfile(format!("unknown vehicle class '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelClass {
    Gasoline,
    Diesel,
    Electric,
    Hybrid,
    Cng,
}

impl FuelClass {
    pub fn is_combustion(self) -> bool {
        matches!(self, FuelClass::Gasoline | FuelClass::Diesel | FuelClass::Cng)
    }
}

/// Physical and preference attributes of the vehicle being routed.
///
/// Dimensions are optional; an absent dimension never violates a road limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub vehicle_class: VehicleClass,
    pub fuel_class: FuelClass,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub width_m: Option<f64>,
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub max_speed_kmh: Option<f64>,
    pub average_speed_kmh: f64,
    /// Liters or kWh per km depending on the fuel class.
    pub consumption_per_km: f64,
    pub emissions_kg_per_km: f64,
    #[serde(default)]
    pub avoid_highways: bool,
    #[serde(default)]
    pub avoid_tolls: bool,
    #[serde(default)]
    pub avoid_ferries: bool,
    #[serde(default)]
    pub avoid_unpaved: bool,
    #[serde(default)]
    pub hazmat: bool,
}

impl VehicleProfile {
    fn base(vehicle_class: VehicleClass, fuel_class: FuelClass) -> Self {
        Self {
            vehicle_class,
            fuel_class,
            height_m: None,
            width_m: None,
            length_m: None,
            weight_kg: None,
            max_speed_kmh: None,
            average_speed_kmh: 50.0,
            consumption_per_km: 0.08,
            emissions_kg_per_km: 0.12,
            avoid_highways: false,
            avoid_tolls: false,
            avoid_ferries: false,
            avoid_unpaved: false,
            hazmat: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn with_dimensions(
        mut self,
        height_m: f64,
        width_m: f64,
        length_m: f64,
        weight_kg: f64,
        max_speed_kmh: f64,
        average_speed_kmh: f64,
        consumption_per_km: f64,
        emissions_kg_per_km: f64,
    ) -> Self {
        self.height_m = Some(height_m);
        self.width_m = Some(width_m);
        self.length_m = Some(length_m);
        self.weight_kg = Some(weight_kg);
        self.max_speed_kmh = Some(max_speed_kmh);
        self.average_speed_kmh = average_speed_kmh;
        self.consumption_per_km = consumption_per_km;
        self.emissions_kg_per_km = emissions_kg_per_km;
        self
    }

    pub fn car() -> Self {
        Self::base(VehicleClass::Car, FuelClass::Gasoline)
            .with_dimensions(1.5, 1.8, 4.5, 1500.0, 180.0, 60.0, 0.08, 0.12)
    }

    pub fn truck() -> Self {
        Self::base(VehicleClass::Truck, FuelClass::Diesel)
            .with_dimensions(4.0, 2.5, 12.0, 18_000.0, 90.0, 50.0, 0.25, 0.35)
    }

    pub fn van() -> Self {
        Self::base(VehicleClass::Van, FuelClass::Diesel)
            .with_dimensions(2.5, 2.0, 5.5, 3500.0, 130.0, 55.0, 0.10, 0.18)
    }

    pub fn motorcycle() -> Self {
        Self::base(VehicleClass::Motorcycle, FuelClass::Gasoline)
            .with_dimensions(1.2, 0.8, 2.0, 200.0, 180.0, 50.0, 0.04, 0.06)
    }

    /// Pedal bicycle; modelled without a fuel draw and without emissions.
    pub fn bicycle() -> Self {
        let mut profile = Self::base(VehicleClass::Bicycle, FuelClass::Electric)
            .with_dimensions(1.1, 0.6, 1.8, 100.0, 35.0, 15.0, 0.0, 0.0);
        profile.avoid_highways = true;
        profile
    }

    pub fn electric_car() -> Self {
        Self::base(VehicleClass::ElectricCar, FuelClass::Electric)
            .with_dimensions(1.5, 1.8, 4.5, 1800.0, 150.0, 60.0, 0.15, 0.0)
    }

    pub fn electric_truck() -> Self {
        Self::base(VehicleClass::ElectricTruck, FuelClass::Electric)
            .with_dimensions(3.8, 2.5, 12.0, 16_000.0, 90.0, 50.0, 1.2, 0.0)
    }

    pub fn preset(class: VehicleClass) -> Self {
        match class {
            VehicleClass::Car => Self::car(),
            VehicleClass::Truck => Self::truck(),
            VehicleClass::Van => Self::van(),
            VehicleClass::Motorcycle => Self::motorcycle(),
            VehicleClass::Bicycle => Self::bicycle(),
            VehicleClass::ElectricCar => Self::electric_car(),
            VehicleClass::ElectricTruck => Self::electric_truck(),
        }
    }

    /// Whether the vehicle must be routed under heavy-vehicle rules.
    pub fn requires_heavy_vehicle_routing(&self) -> bool {
        self.vehicle_class.is_truck_like()
            || self.weight_kg.is_some_and(|w| w > HEAVY_WEIGHT_KG)
            || self.height_m.is_some_and(|h| h > HEAVY_HEIGHT_M)
            || self.length_m.is_some_and(|l| l > HEAVY_LENGTH_M)
    }

    pub fn is_electric(&self) -> bool {
        self.fuel_class == FuelClass::Electric
    }

    /// Every attribute that influences filtering, as a stable string.
    pub fn fingerprint(&self) -> String {
        let dim = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v}"));
        format!(
            "{}|{}|{}|{}|{}|{}|{}{}{}{}{}",
            self.vehicle_class,
            dim(self.height_m),
            dim(self.width_m),
            dim(self.length_m),
            dim(self.weight_kg),
            dim(self.max_speed_kmh),
            u8::from(self.avoid_highways),
            u8::from(self.avoid_tolls),
            u8::from(self.avoid_ferries),
            u8::from(self.avoid_unpaved),
            u8::from(self.hazmat),
        )
    }

    /// Reject contradictory or physically meaningless profiles.
    pub fn validate(&self) -> Result<(), VehicleError> {
        let dimensions = [
            ("height_m", self.height_m),
            ("width_m", self.width_m),
            ("length_m", self.length_m),
            ("weight_kg", self.weight_kg),
            ("max_speed_kmh", self.max_speed_kmh),
        ];
        for (name, value) in dimensions {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(VehicleError::InvalidProfile(format!(
                        "{name} must be a positive number, got {v}"
                    )));
                }
            }
        }

        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err(VehicleError::InvalidProfile(format!(
                "average_speed_kmh must be a positive number, got {}",
                self.average_speed_kmh
            )));
        }

        if let Some(max) = self.max_speed_kmh {
            if max < self.average_speed_kmh {
                return Err(VehicleError::InvalidProfile(format!(
                    "max_speed_kmh {max} is below average_speed_kmh {}",
                    self.average_speed_kmh
                )));
            }
        }

        for (name, v) in [
            ("consumption_per_km", self.consumption_per_km),
            ("emissions_kg_per_km", self.emissions_kg_per_km),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(VehicleError::InvalidProfile(format!(
                    "{name} must be non-negative, got {v}"
                )));
            }
        }

        if self.vehicle_class.is_electric() && self.fuel_class.is_combustion() {
            return Err(VehicleError::InvalidProfile(format!(
                "{} cannot use fuel class {:?}",
                self.vehicle_class, self.fuel_class
            )));
        }

        Ok(())
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::car()
    }
}
