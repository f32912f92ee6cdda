//! One row of a country's postal code table.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A postal code owned by a city, with its coordinate once geocoded.
///
/// `coordinate` stays `None` for codes the upstream geocoder could not
/// resolve. Such records can be looked up but never match a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalCodeRecord {
    pub postal_code: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl PostalCodeRecord {
    pub fn new(postal_code: &str, city: &str, coordinate: Option<Coordinate>) -> Self {
        Self {
            postal_code: postal_code.to_string(),
            city: city.to_string(),
            coordinate,
        }
    }

    /// Record with a known coordinate
    pub fn geocoded(postal_code: &str, city: &str, lat: f64, lon: f64) -> Self {
        Self::new(postal_code, city, Some(Coordinate::new(lat, lon)))
    }

    pub fn is_geocoded(&self) -> bool {
        self.coordinate.is_some()
    }
}
