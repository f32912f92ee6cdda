//! Great-circle distance.

use super::EARTH_MEAN_RADIUS_KM;
use crate::models::Coordinate;

/// Haversine distance in kilometers on a sphere of the given radius.
///
/// Degrees are not range checked.
pub fn haversine_km(a: Coordinate, b: Coordinate, earth_radius_km: f64) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = ((d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    earth_radius_km * c
}

/// Haversine distance in kilometers using the Earth mean radius
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    haversine_km(a, b, EARTH_MEAN_RADIUS_KM)
}
