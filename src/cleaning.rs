//! Cleaning of scraped city/postal code listings.
//!
//! Scraped listings put every postal code of a city into one cell, mixing
//! comma separated codes with dash separated ranges
//! (`"73430–73434, 73479"`). These helpers expand such cells into single
//! codes and explode a city table into one row per code.

use csv::ReaderBuilder;
use hashbrown::HashSet;
use regex::Regex;
use serde::Deserialize;
use std::io::Read;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::PostalCodeRecord;

static NOT_CODE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,\-–—]").expect("static regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("static regex"));

/// Largest range accepted in one cell
const MAX_RANGE_LEN: u64 = 10_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleaningError {
    #[error("malformed postal code range '{0}'")]
    MalformedRange(String),
}

/// One scraped row: a city and its raw postal code cell
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawCityRow {
    pub city: String,
    pub postal_code: String,
}

/// Expand a raw postal code cell into individual codes.
///
/// Everything except digits, commas and dashes is dropped first. Ranges keep
/// the zero padding of their start code (`01067–01069` gives `01067`,
/// `01068`, `01069`).
pub fn expand_postal_codes(raw: &str) -> Result<Vec<String>, CleaningError> {
    let cleaned = NOT_CODE_CHARS.replace_all(raw, "");
    let mut codes = Vec::new();

    for element in cleaned.split(',') {
        if element.is_empty() {
            continue;
        }

        if !element.contains(['-', '–', '—']) {
            codes.push(element.to_string());
            continue;
        }

        let bounds: Vec<&str> = DIGITS.find_iter(element).map(|m| m.as_str()).collect();
        let (start, end) = match bounds.as_slice() {
            [start, end] => (*start, *end),
            // A lone dash is a prefix like "D-10115", not a range
            [code] => {
                codes.push(code.to_string());
                continue;
            }
            _ => return Err(CleaningError::MalformedRange(element.to_string())),
        };

        let width = start.len();
        let malformed = || CleaningError::MalformedRange(element.to_string());
        let first: u64 = start.parse().map_err(|_| malformed())?;
        let last: u64 = end.parse().map_err(|_| malformed())?;
        if last < first || last - first >= MAX_RANGE_LEN {
            return Err(malformed());
        }

        codes.extend((first..=last).map(|n| format!("{:0width$}", n, width = width)));
    }

    Ok(codes)
}

/// Strip parenthesized notes and anything after a slash from a city name
pub fn normalize_city_name(raw: &str) -> String {
    let without_notes = PARENTHESIZED.replace_all(raw, "");
    let head = without_notes.split('/').next().unwrap_or_default();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Explode city rows into one record per postal code.
///
/// A code claimed by several cities stays with the first one. Cells that
/// cannot be expanded are logged and skipped. The records carry no
/// coordinate yet.
pub fn split_city_rows<I>(rows: I) -> Vec<PostalCodeRecord>
where
    I: IntoIterator<Item = RawCityRow>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for row in rows {
        let city = normalize_city_name(&row.city);
        let codes = match expand_postal_codes(&row.postal_code) {
            Ok(codes) => codes,
            Err(e) => {
                warn!("Skipping postal codes of {}: {}", city, e);
                continue;
            }
        };
        if codes.is_empty() {
            warn!("No postal codes found for {}", city);
            continue;
        }

        for code in codes {
            if !seen.insert(code.clone()) {
                debug!("Postal code {} already assigned, skipping for {}", code, city);
                continue;
            }
            records.push(PostalCodeRecord::new(&code, &city, None));
        }
    }

    records
}

/// Parse a `City,PostalCode` CSV of raw scraped rows
pub fn read_raw_cities<R: Read>(reader: R) -> Result<Vec<RawCityRow>, csv::Error> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize().collect()
}
