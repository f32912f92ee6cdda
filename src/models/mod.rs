//! Core data models for the postal code dataset.

pub mod coordinate;
pub mod record;

pub use coordinate::{Coordinate, CoordinateError};
pub use record::PostalCodeRecord;
