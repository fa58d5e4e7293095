//! Great-circle distance on a spherical Earth.

use crate::models::Coordinate;

/// Mean Earth radius (IUGG), meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine (great-circle) distance between two points, in meters.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Convert a ground distance to the angle it spans at the Earth's centre.
pub fn meters_to_radians(meters: f64) -> f64 {
    meters / EARTH_RADIUS_M
}
