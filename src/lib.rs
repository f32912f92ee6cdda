//! postal-radius - postal code proximity search
//!
//! Loads a country's postal code table with coordinates and answers
//! "which postal codes lie within N km of this code or city" queries, by
//! exact great-circle distance or by a bounding box prefilter.

pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod export;
pub mod geodesy;
pub mod models;
pub mod proximity;

pub use dataset::GeoDataset;
pub use models::{Coordinate, PostalCodeRecord};
pub use proximity::{ProximityEngine, ProximityError, QueryResult, Reference, SearchStrategy};
