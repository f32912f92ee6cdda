//! Spherical distance and bounding box math.
//!
//! Both functions are pure and take their constants from a [`Geodesy`]
//! value so they can be tested with any earth model.

mod bbox;
mod distance;

pub use bbox::BoundingBox;
pub use distance::{distance, haversine_km};

use serde::Deserialize;

/// Earth mean radius in kilometers (IUGG)
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Approximate kilometers per degree used by the bounding box prefilter
pub const KM_PER_DEGREE: f64 = 111.32;

/// Smallest |cos(lat)| used when widening the longitude span near the poles
pub const MIN_COS_LATITUDE: f64 = 1e-6;

/// Constants shared by the distance and bounding box calculations
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Geodesy {
    pub earth_radius_km: f64,
    pub km_per_degree: f64,
    pub min_cos_latitude: f64,
}

impl Geodesy {
    pub const WGS84: Geodesy = Geodesy {
        earth_radius_km: EARTH_MEAN_RADIUS_KM,
        km_per_degree: KM_PER_DEGREE,
        min_cos_latitude: MIN_COS_LATITUDE,
    };
}

impl Default for Geodesy {
    fn default() -> Self {
        Self::WGS84
    }
}
