//! WGS84 latitude/longitude pair.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geographic point in degrees (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Create a coordinate without range checks.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate, rejecting out-of-range or non-finite degrees.
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// R-tree key, `[lon, lat]` like every other envelope in the crate
    pub fn as_xy(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<Coordinate> for geo_types::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo_types::Point::new(c.lon, c.lat)
    }
}

impl From<geo_types::Point<f64>> for Coordinate {
    fn from(p: geo_types::Point<f64>) -> Self {
        Coordinate::new(p.y(), p.x())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}
