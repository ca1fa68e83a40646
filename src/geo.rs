//! Great-circle distance between facilities

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance to another point in kilometers
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine great-circle distance in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAGOS: Coordinates = Coordinates { latitude: 6.5244, longitude: 3.3792 };
    const KANO: Coordinates = Coordinates { latitude: 12.0022, longitude: 8.5920 };

    #[test]
    fn test_zero_for_identical_points() {
        assert_eq!(LAGOS.distance_to(&LAGOS), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let there = LAGOS.distance_to(&KANO);
        let back = KANO.distance_to(&LAGOS);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_lagos_to_kano() {
        // Roughly 830 km as the crow flies
        let distance = LAGOS.distance_to(&KANO);
        assert!(distance > 800.0 && distance < 860.0, "got {}", distance);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let distance = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((distance - 111.19).abs() < 0.1);
    }
}
