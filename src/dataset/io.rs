//! CSV persistence for the dataset and coordinate tables.
//!
//! Dataset header: `City,PostalCode,Latitude,Longitude`. Empty coordinate
//! cells mean the code was never geocoded. Extra columns are ignored.

use csv::{ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

use super::{DatasetError, GeoDataset};
use crate::models::{Coordinate, PostalCodeRecord};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DatasetRow {
    city: String,
    postal_code: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CoordinateRow {
    postal_code: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn to_coordinate(
    postal_code: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<Coordinate>, DatasetError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Coordinate::try_new(lat, lon)
            .map(Some)
            .map_err(|source| DatasetError::InvalidCoordinate {
                postal_code: postal_code.to_string(),
                source,
            }),
        (None, None) => Ok(None),
        _ => Err(DatasetError::PartialCoordinate(postal_code.to_string())),
    }
}

fn open(path: &Path) -> Result<Box<dyn Read>, DatasetError> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Parse a dataset CSV
pub fn read_dataset<R: Read>(reader: R) -> Result<GeoDataset, DatasetError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<DatasetRow>() {
        let row = row?;
        let coordinate = to_coordinate(&row.postal_code, row.latitude, row.longitude)?;
        records.push(PostalCodeRecord {
            postal_code: row.postal_code,
            city: row.city,
            coordinate,
        });
    }

    Ok(GeoDataset::from_records(records))
}

/// Load a dataset CSV from disk (`.gz` is decompressed)
pub fn load_dataset(path: &Path) -> Result<GeoDataset, DatasetError> {
    info!("Loading postal code dataset from {}", path.display());
    let dataset = read_dataset(open(path)?)?;
    info!(
        "Loaded {} postal codes ({} geocoded)",
        dataset.len(),
        dataset.geocoded_len()
    );
    if dataset.geocoded_len() < dataset.len() {
        warn!(
            "{} postal codes have no coordinate and will never match a query",
            dataset.len() - dataset.geocoded_len()
        );
    }
    Ok(dataset)
}

/// Write records as a dataset CSV
pub fn write_dataset<'a, W, I>(writer: W, records: I) -> Result<(), DatasetError>
where
    W: Write,
    I: IntoIterator<Item = &'a PostalCodeRecord>,
{
    let mut csv_writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        csv_writer.serialize(DatasetRow {
            city: record.city.clone(),
            postal_code: record.postal_code.clone(),
            latitude: record.coordinate.map(|c| c.lat),
            longitude: record.coordinate.map(|c| c.lon),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_dataset<'a, I>(path: &Path, records: I) -> Result<(), DatasetError>
where
    I: IntoIterator<Item = &'a PostalCodeRecord>,
{
    let file = File::create(path)?;
    write_dataset(file, records)
}

/// Parse a `PostalCode,Latitude,Longitude` table; rows without a coordinate are skipped
pub fn read_coordinates<R: Read>(reader: R) -> Result<HashMap<String, Coordinate>, DatasetError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut map = HashMap::new();
    for row in csv_reader.deserialize::<CoordinateRow>() {
        let row = row?;
        if let Some(coordinate) = to_coordinate(&row.postal_code, row.latitude, row.longitude)? {
            map.entry(row.postal_code).or_insert(coordinate);
        }
    }
    Ok(map)
}

pub fn load_coordinates(path: &Path) -> Result<HashMap<String, Coordinate>, DatasetError> {
    info!("Loading coordinates from {}", path.display());
    let map = read_coordinates(open(path)?)?;
    info!("Loaded {} coordinates", map.len());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
City,PostalCode,Latitude,Longitude
Berlin,10115,52.5321,13.3846
Dresden,01067,51.0580,13.7220
Aalen,73432,,
";

    #[test]
    fn test_read_dataset_keeps_leading_zeros() {
        let ds = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        let dresden = ds.get("01067").unwrap();
        assert_eq!(dresden.city, "Dresden");
        assert_eq!(dresden.coordinate, Some(Coordinate::new(51.0580, 13.7220)));
    }

    #[test]
    fn test_empty_coordinates_are_none() {
        let ds = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.get("73432").unwrap().coordinate, None);
        assert_eq!(ds.geocoded_len(), 2);
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "PostalCode,Longitude,Latitude,City,State\n10115,13.3846,52.5321,Berlin,BE\n";
        let ds = read_dataset(csv.as_bytes()).unwrap();
        assert_eq!(
            ds.get("10115").unwrap().coordinate,
            Some(Coordinate::new(52.5321, 13.3846))
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let csv = "City,PostalCode,Latitude,Longitude\nNowhere,99999,123.0,10.0\n";
        let err = read_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidCoordinate { ref postal_code, .. } if postal_code == "99999"
        ));
    }

    #[test]
    fn test_partial_coordinate_rejected() {
        let csv = "City,PostalCode,Latitude,Longitude\nHalf,12345,52.0,\n";
        let err = read_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::PartialCoordinate(ref pc) if pc == "12345"));
    }

    #[test]
    fn test_write_then_read_preserves_missing_coordinates() {
        let ds = read_dataset(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_dataset(&mut buf, ds.iter()).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("City,PostalCode,Latitude,Longitude\n"));
        assert!(text.contains("Aalen,73432,,\n"));

        let reread = read_dataset(buf.as_slice()).unwrap();
        assert_eq!(reread.records(), ds.records());
    }

    #[test]
    fn test_read_coordinates_skips_missing() {
        let csv = "PostalCode,Longitude,Latitude\n10115,13.3846,52.5321\n73432,,\n";
        let map = read_coordinates(csv.as_bytes()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["10115"], Coordinate::new(52.5321, 13.3846));
    }
}
