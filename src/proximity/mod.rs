//! Proximity queries over a [`GeoDataset`](crate::dataset::GeoDataset).
//!
//! A query resolves a reference (postal code or city) to a coordinate and
//! then keeps every geocoded record within a radius of it, either by exact
//! haversine distance or by the cheaper bounding box test.

mod engine;
mod reference;

pub use engine::{
    find_nearby, find_nearby_by_bounding, find_nearby_by_distance, ProximityEngine, Query,
};
pub use reference::{CityResolution, Reference, ResolvedReference};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProximityError {
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),
    #[error("reference {0} has no coordinate")]
    UnresolvedCoordinate(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// How candidates are tested against the radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Exact great-circle distance, full scan
    #[default]
    Distance,
    /// Lat/lon rectangle, over-includes the corners
    Bounding,
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStrategy::Distance => write!(f, "distance"),
            SearchStrategy::Bounding => write!(f, "bounding"),
        }
    }
}

impl std::str::FromStr for SearchStrategy {
    type Err = ProximityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(SearchStrategy::Distance),
            "bounding" => Ok(SearchStrategy::Bounding),
            other => Err(ProximityError::InvalidArgument(format!(
                "unknown strategy '{}'",
                other
            ))),
        }
    }
}

/// Postal codes matched by one query.
///
/// The reference's own code is part of the set whenever it is geocoded,
/// since its distance of zero is within any radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub reference: ResolvedReference,
    pub radius_km: f64,
    pub strategy: SearchStrategy,
    pub postal_codes: BTreeSet<String>,
}

impl QueryResult {
    pub fn contains(&self, postal_code: &str) -> bool {
        self.postal_codes.contains(postal_code)
    }

    pub fn len(&self) -> usize {
        self.postal_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postal_codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.postal_codes.iter().map(String::as_str)
    }
}
