//! Immutable postal code table for one country.
//!
//! Built once from upstream rows, then shared read-only by every query.
//! Keeps insertion order for city resolution, a postal code lookup map, and
//! an R-tree over the geocoded rows for box queries.

mod index;
mod io;

pub use index::RecordIndex;
pub use io::{
    load_coordinates, load_dataset, read_coordinates, read_dataset, save_dataset, write_dataset,
};

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::geodesy::BoundingBox;
use crate::models::{Coordinate, CoordinateError, PostalCodeRecord};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("postal code {postal_code}: {source}")]
    InvalidCoordinate {
        postal_code: String,
        #[source]
        source: CoordinateError,
    },
    #[error("postal code {0} has only one of latitude/longitude")]
    PartialCoordinate(String),
}

/// Read-only postal code table
#[derive(Debug)]
pub struct GeoDataset {
    records: Vec<PostalCodeRecord>,
    by_code: HashMap<String, usize>,
    index: RecordIndex,
}

impl GeoDataset {
    /// Build a dataset, keeping the first record of any repeated postal code
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PostalCodeRecord>,
    {
        let mut kept: Vec<PostalCodeRecord> = Vec::new();
        let mut by_code: HashMap<String, usize> = HashMap::new();
        let mut duplicates = 0usize;

        for record in records {
            if by_code.contains_key(&record.postal_code) {
                debug!(
                    "Dropping duplicate postal code {} ({})",
                    record.postal_code, record.city
                );
                duplicates += 1;
                continue;
            }
            by_code.insert(record.postal_code.clone(), kept.len());
            kept.push(record);
        }

        if duplicates > 0 {
            warn!("Dropped {} duplicate postal codes", duplicates);
        }

        let index = RecordIndex::build(&kept);
        debug!(
            "Dataset built with {} records ({} geocoded)",
            kept.len(),
            index.len()
        );

        Self {
            records: kept,
            by_code,
            index,
        }
    }

    /// Record for an exact postal code
    pub fn get(&self, postal_code: &str) -> Option<&PostalCodeRecord> {
        self.by_code.get(postal_code).map(|&i| &self.records[i])
    }

    pub fn contains_postal_code(&self, postal_code: &str) -> bool {
        self.by_code.contains_key(postal_code)
    }

    /// First record of a city in dataset order (case-sensitive match)
    pub fn first_in_city(&self, city: &str) -> Option<&PostalCodeRecord> {
        self.records.iter().find(|r| r.city == city)
    }

    /// All records of a city in dataset order
    pub fn in_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a PostalCodeRecord> {
        self.records.iter().filter(move |r| r.city == city)
    }

    /// Records with a coordinate, paired with it
    pub fn geocoded(&self) -> impl Iterator<Item = (&PostalCodeRecord, Coordinate)> {
        self.records
            .iter()
            .filter_map(|r| r.coordinate.map(|c| (r, c)))
    }

    /// Geocoded records inside a box (edges inclusive)
    pub fn locate_in_box(&self, bbox: &BoundingBox) -> impl Iterator<Item = &PostalCodeRecord> {
        self.index
            .locate_in_box(bbox)
            .map(move |i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostalCodeRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PostalCodeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that carry a coordinate
    pub fn geocoded_len(&self) -> usize {
        self.index.len()
    }
}

impl FromIterator<PostalCodeRecord> for GeoDataset {
    fn from_iter<T: IntoIterator<Item = PostalCodeRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}
