use geo::{GeodesicDistance, Point};

use crate::models::Coordinates;

/// Geodesic distance between two points in kilometers, rounded to 2 decimals
///
/// Uses the WGS-84 ellipsoid. Callers must resolve both points first; an
/// address without coordinates never reaches this function.
///
/// # Arguments
/// * `a` - First point
/// * `b` - Second point
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn calc_distance(a: Coordinates, b: Coordinates) -> f64 {
    // geo points are (x = lon, y = lat)
    let from = Point::new(a.lon, a.lat);
    let to = Point::new(b.lon, b.lat);

    round_km(from.geodesic_distance(&to) / 1000.0)
}

/// Round a distance to 2 decimals, halves away from zero
#[inline]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
