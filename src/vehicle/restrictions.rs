//! Road restrictions derived from OpenStreetMap-style tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VehicleProfile;

const UNPAVED_SURFACES: [&str; 5] = ["unpaved", "gravel", "dirt", "sand", "grass"];

/// Legal and physical limits attached to a single road segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadRestrictions {
    pub max_height_m: Option<f64>,
    pub max_width_m: Option<f64>,
    pub max_length_m: Option<f64>,
    pub max_weight_kg: Option<f64>,
    pub no_heavy_vehicles: bool,
    pub no_hazmat: bool,
    pub toll: bool,
    pub unpaved: bool,
    pub ferry: bool,
}

impl RoadRestrictions {
    /// Parse restrictions from raw edge tags.
    ///
    /// `maxweight` is expressed in tonnes. Values that fail to parse impose
    /// no limit.
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| tags.get(key).map(|v| v.trim());
        let number = |key: &str| get(key).and_then(parse_measure);

        Self {
            max_height_m: number("maxheight"),
            max_width_m: number("maxwidth"),
            max_length_m: number("maxlength"),
            max_weight_kg: number("maxweight").map(|tonnes| tonnes * 1000.0),
            no_heavy_vehicles: get("hgv") == Some("no") || get("goods") == Some("no"),
            no_hazmat: get("hazmat") == Some("no"),
            toll: get("toll") == Some("yes"),
            unpaved: get("surface").is_some_and(|s| UNPAVED_SURFACES.contains(&s)),
            ferry: get("route") == Some("ferry") || get("ferry") == Some("yes"),
        }
    }

    /// Whether `vehicle` may legally and physically use this segment.
    pub fn allows(&self, vehicle: &VehicleProfile) -> bool {
        self.violation(vehicle).is_none()
    }

    /// The first restriction `vehicle` breaks, if any.
    pub fn violation(&self, vehicle: &VehicleProfile) -> Option<&'static str> {
        if exceeds(vehicle.height_m, self.max_height_m) {
            return Some("height limit");
        }
        if exceeds(vehicle.width_m, self.max_width_m) {
            return Some("width limit");
        }
        if exceeds(vehicle.length_m, self.max_length_m) {
            return Some("length limit");
        }
        if exceeds(vehicle.weight_kg, self.max_weight_kg) {
            return Some("weight limit");
        }
        if self.no_heavy_vehicles && vehicle.requires_heavy_vehicle_routing() {
            return Some("heavy vehicles prohibited");
        }
        if self.no_hazmat && vehicle.hazmat {
            return Some("hazardous materials prohibited");
        }
        if self.toll && vehicle.avoid_tolls {
            return Some("toll road avoided");
        }
        if self.unpaved && vehicle.avoid_unpaved {
            return Some("unpaved surface avoided");
        }
        if self.ferry && vehicle.avoid_ferries {
            return Some("ferry avoided");
        }
        None
    }
}

fn exceeds(attribute: Option<f64>, limit: Option<f64>) -> bool {
    matches!((attribute, limit), (Some(a), Some(l)) if a > l)
}

/// Parse a numeric tag such as `"3.8"` or `"3.8 m"`.
fn parse_measure(raw: &str) -> Option<f64> {
    let numeric = raw.trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parses_osm_tags() {
        let r = RoadRestrictions::from_tags(&tags(&[
            ("maxheight", "3.8"),
            ("maxweight", "7.5"),
            ("hgv", "no"),
            ("surface", "gravel"),
            ("toll", "yes"),
        ]));
        assert_eq!(r.max_height_m, Some(3.8));
        assert_eq!(r.max_weight_kg, Some(7500.0));
        assert!(r.no_heavy_vehicles);
        assert!(r.unpaved);
        assert!(r.toll);
        assert!(!r.ferry);
    }

    #[test]
    fn test_unparseable_limit_is_ignored() {
        let r = RoadRestrictions::from_tags(&tags(&[("maxheight", "default")]));
        assert_eq!(r.max_height_m, None);
        assert!(r.allows(&VehicleProfile::truck()));
    }

    #[test]
    fn test_height_limit_blocks_truck_but_not_car() {
        let r = RoadRestrictions::from_tags(&tags(&[("maxheight", "3.5")]));
        assert!(!r.allows(&VehicleProfile::truck()));
        assert!(r.allows(&VehicleProfile::car()));
    }

    #[test]
    fn test_missing_vehicle_attribute_never_violates() {
        let r = RoadRestrictions::from_tags(&tags(&[("maxheight", "2.0"), ("maxweight", "1")]));
        let mut unknown = VehicleProfile::car();
        unknown.height_m = None;
        unknown.weight_kg = None;
        assert!(r.allows(&unknown));
    }

    #[test]
    fn test_preference_flags() {
        let toll = RoadRestrictions::from_tags(&tags(&[("toll", "yes")]));
        let mut car = VehicleProfile::car();
        assert!(toll.allows(&car));
        car.avoid_tolls = true;
        assert_eq!(toll.violation(&car), Some("toll road avoided"));

        let ferry = RoadRestrictions::from_tags(&tags(&[("route", "ferry")]));
        car.avoid_ferries = true;
        assert!(!ferry.allows(&car));

        let hazmat = RoadRestrictions::from_tags(&tags(&[("hazmat", "no")]));
        let mut tanker = VehicleProfile::truck();
        assert!(hazmat.allows(&tanker));
        tanker.hazmat = true;
        assert!(!hazmat.allows(&tanker));
    }

    #[test]
    fn test_measure_with_unit_suffix() {
        assert_eq!(parse_measure("4.2 m"), Some(4.2));
        assert_eq!(parse_measure("none"), None);
    }
}
