//! Radius search strategies.

use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

use super::reference::{resolve, CityResolution, Reference};
use super::{ProximityError, QueryResult, SearchStrategy};
use crate::dataset::GeoDataset;
use crate::geodesy::{haversine_km, BoundingBox, Geodesy};

/// One entry of a batch submitted to [`ProximityEngine::find_many`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Query {
    pub reference: Reference,
    pub radius_km: f64,
    #[serde(default)]
    pub strategy: SearchStrategy,
}

impl Query {
    pub fn new(reference: impl Into<Reference>, radius_km: f64, strategy: SearchStrategy) -> Self {
        Self {
            reference: reference.into(),
            radius_km,
            strategy,
        }
    }
}

/// Stateless query runner carrying the earth model and city policy.
///
/// Holds no reference to the dataset, so one engine can serve any number of
/// datasets and threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityEngine {
    geodesy: Geodesy,
    city_resolution: CityResolution,
}

impl ProximityEngine {
    pub fn new(geodesy: Geodesy, city_resolution: CityResolution) -> Self {
        Self {
            geodesy,
            city_resolution,
        }
    }

    pub fn geodesy(&self) -> &Geodesy {
        &self.geodesy
    }

    pub fn city_resolution(&self) -> CityResolution {
        self.city_resolution
    }

    fn check_radius(radius_km: f64) -> Result<(), ProximityError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ProximityError::InvalidArgument(format!(
                "radius must be a non-negative number of kilometers, got {}",
                radius_km
            )));
        }
        Ok(())
    }

    /// Every geocoded record within `radius_km` great-circle distance
    pub fn find_nearby_by_distance(
        &self,
        dataset: &GeoDataset,
        reference: &Reference,
        radius_km: f64,
    ) -> Result<QueryResult, ProximityError> {
        Self::check_radius(radius_km)?;
        let resolved = resolve(dataset, reference, self.city_resolution)?;
        let center = resolved.coordinate;
        let earth_radius = self.geodesy.earth_radius_km;

        let postal_codes: BTreeSet<String> = dataset
            .geocoded()
            .filter(|(_, c)| haversine_km(center, *c, earth_radius) <= radius_km)
            .map(|(r, _)| r.postal_code.clone())
            .collect();

        debug!(
            "Distance search around {} ({} km): {} of {} postal codes",
            center,
            radius_km,
            postal_codes.len(),
            dataset.geocoded_len()
        );

        Ok(QueryResult {
            reference: resolved,
            radius_km,
            strategy: SearchStrategy::Distance,
            postal_codes,
        })
    }

    /// Every geocoded record inside the bounding box of the radius.
    ///
    /// Approximate: the box contains the circle and its corners reach beyond
    /// it, so this is a superset of the distance search.
    pub fn find_nearby_by_bounding(
        &self,
        dataset: &GeoDataset,
        reference: &Reference,
        radius_km: f64,
    ) -> Result<QueryResult, ProximityError> {
        Self::check_radius(radius_km)?;
        let resolved = resolve(dataset, reference, self.city_resolution)?;
        let bbox = BoundingBox::around(resolved.coordinate, radius_km, &self.geodesy);

        let postal_codes: BTreeSet<String> = dataset
            .locate_in_box(&bbox)
            .map(|r| r.postal_code.clone())
            .collect();

        debug!(
            "Bounding search around {} ({} km, box {:?}): {} of {} postal codes",
            resolved.coordinate,
            radius_km,
            bbox,
            postal_codes.len(),
            dataset.geocoded_len()
        );

        Ok(QueryResult {
            reference: resolved,
            radius_km,
            strategy: SearchStrategy::Bounding,
            postal_codes,
        })
    }

    pub fn find_nearby(
        &self,
        dataset: &GeoDataset,
        reference: &Reference,
        radius_km: f64,
        strategy: SearchStrategy,
    ) -> Result<QueryResult, ProximityError> {
        match strategy {
            SearchStrategy::Distance => self.find_nearby_by_distance(dataset, reference, radius_km),
            SearchStrategy::Bounding => self.find_nearby_by_bounding(dataset, reference, radius_km),
        }
    }

    /// Run independent queries in parallel; results keep the input order
    pub fn find_many(
        &self,
        dataset: &GeoDataset,
        queries: &[Query],
    ) -> Vec<Result<QueryResult, ProximityError>> {
        queries
            .par_iter()
            .map(|q| self.find_nearby(dataset, &q.reference, q.radius_km, q.strategy))
            .collect()
    }
}

/// [`ProximityEngine::find_nearby_by_distance`] with default settings
pub fn find_nearby_by_distance(
    dataset: &GeoDataset,
    reference: &Reference,
    radius_km: f64,
) -> Result<QueryResult, ProximityError> {
    ProximityEngine::default().find_nearby_by_distance(dataset, reference, radius_km)
}

/// [`ProximityEngine::find_nearby_by_bounding`] with default settings
pub fn find_nearby_by_bounding(
    dataset: &GeoDataset,
    reference: &Reference,
    radius_km: f64,
) -> Result<QueryResult, ProximityError> {
    ProximityEngine::default().find_nearby_by_bounding(dataset, reference, radius_km)
}

pub fn find_nearby(
    dataset: &GeoDataset,
    reference: &Reference,
    radius_km: f64,
    strategy: SearchStrategy,
) -> Result<QueryResult, ProximityError> {
    ProximityEngine::default().find_nearby(dataset, reference, radius_km, strategy)
}
