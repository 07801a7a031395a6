//! Geographic primitives shared by pins, events, and discovery.
//!
//! Coordinates are WGS84 degrees: latitude in [-90, 90], longitude in
//! [-180, 180]. Distances are great-circle kilometers on a sphere of
//! radius [`EARTH_RADIUS_KM`].

use crate::error::{Error, Result};

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinate pairs, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let to_rad = |deg: f64| deg.to_radians();
    let dlat = to_rad(lat2 - lat1);
    let dlon = to_rad(lon2 - lon1);
    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Whether a coordinate pair is finite and inside the valid WGS84 ranges.
///
/// Discovery uses this to skip malformed rows instead of failing the
/// whole query.
pub fn coordinates_in_range(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Validates a coordinate pair at write time.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<()> {
    if !coordinates_in_range(lat, lng) {
        return Err(Error::Validation(format!(
            "coordinates ({}, {}) are outside the valid latitude/longitude ranges",
            lat, lng
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        assert_eq!(haversine_km(52.37, 4.89, 52.37, 4.89), 0.0);
    }

    #[test]
    fn test_quarter_circumference_along_equator() {
        // (0,0) to (0,90) is a quarter of the equator: ~10007.5 km
        let d = haversine_km(0.0, 0.0, 0.0, 90.0);
        assert!((d - 10007.5).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_known_city_pair() {
        // San Francisco to Los Angeles, ~559 km
        let d = haversine_km(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((d - 559.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = haversine_km(37.77, -122.42, 40.71, -74.01);
        let ba = haversine_km(40.71, -74.01, 37.77, -122.42);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_range_checks() {
        assert!(coordinates_in_range(0.0, 0.0));
        assert!(coordinates_in_range(-90.0, 180.0));
        assert!(coordinates_in_range(90.0, -180.0));
        assert!(!coordinates_in_range(90.01, 0.0));
        assert!(!coordinates_in_range(0.0, -180.5));
        assert!(!coordinates_in_range(f64::NAN, 0.0));
        assert!(!coordinates_in_range(0.0, f64::INFINITY));
    }

    #[test]
    fn test_validate_coordinates_rejects_out_of_range() {
        assert!(validate_coordinates(37.77, -122.42).is_ok());
        let err = validate_coordinates(91.0, 0.0).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
