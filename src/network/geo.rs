//! Coordinates, bounding boxes and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the coordinate lies on the globe.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Coordinate rounded to micro-degrees, for use in cache keys.
    pub fn micro_degrees(&self) -> (i64, i64) {
        (
            (self.lat * 1e6).round() as i64,
            (self.lng * 1e6).round() as i64,
        )
    }
}

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Axis-aligned region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Region spanning both points, padded by `ratio` of the span plus
    /// `extra_deg` on every side.
    pub fn around(a: Coordinate, b: Coordinate, ratio: f64, extra_deg: f64) -> Self {
        let lat_pad = (a.lat - b.lat).abs() * ratio + extra_deg;
        let lng_pad = (a.lng - b.lng).abs() * ratio + extra_deg;
        Self {
            min_lat: (a.lat.min(b.lat) - lat_pad).max(-90.0),
            min_lng: (a.lng.min(b.lng) - lng_pad).max(-180.0),
            max_lat: (a.lat.max(b.lat) + lat_pad).min(90.0),
            max_lng: (a.lng.max(b.lng) + lng_pad).min(180.0),
        }
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat)
            && (self.min_lng..=self.max_lng).contains(&c.lng)
    }

    /// Bounds rounded to micro-degrees, for use in cache keys.
    pub fn micro_degrees(&self) -> [i64; 4] {
        [self.min_lat, self.min_lng, self.max_lat, self.max_lng].map(|v| (v * 1e6).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London is roughly 344 km.
        let paris = Coordinate::new(48.8566, 2.3522);
        let london = Coordinate::new(51.5074, -0.1278);
        let d = haversine_km(paris, london);
        assert!((d - 343.5).abs() < 2.0, "got {d}");
        assert_eq!(haversine_km(paris, paris), 0.0);
    }

    #[test]
    fn test_bbox_padding() {
        let bbox = BoundingBox::around(
            Coordinate::new(10.0, 20.0),
            Coordinate::new(11.0, 22.0),
            0.2,
            0.01,
        );
        assert!((bbox.min_lat - 9.79).abs() < 1e-9);
        assert!((bbox.max_lng - 22.41).abs() < 1e-9);
        assert!(bbox.contains(Coordinate::new(10.5, 21.0)));
        assert!(!bbox.contains(Coordinate::new(12.0, 21.0)));
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
