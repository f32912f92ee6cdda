//! Turning a postal code or city name into a center coordinate.

use serde::{Deserialize, Serialize};

use super::ProximityError;
use crate::dataset::GeoDataset;
use crate::models::{Coordinate, PostalCodeRecord};

/// What a query is centered on.
///
/// Deserializes from `{"postal_code": ..}`, `{"city": ..}`, `{"any": ..}`
/// or a bare string, which is read as [`Reference::Any`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "ReferenceRepr")]
pub enum Reference {
    /// Exact postal code key
    PostalCode(String),
    /// Exact (case-sensitive) city name
    City(String),
    /// Postal code if one matches, otherwise city name
    Any(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceRepr {
    Text(String),
    Tagged(TaggedReference),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedReference {
    PostalCode(String),
    City(String),
    Any(String),
}

impl From<ReferenceRepr> for Reference {
    fn from(repr: ReferenceRepr) -> Self {
        match repr {
            ReferenceRepr::Text(s) => Reference::Any(s),
            ReferenceRepr::Tagged(TaggedReference::PostalCode(s)) => Reference::PostalCode(s),
            ReferenceRepr::Tagged(TaggedReference::City(s)) => Reference::City(s),
            ReferenceRepr::Tagged(TaggedReference::Any(s)) => Reference::Any(s),
        }
    }
}

impl Reference {
    /// Build from separate postal code / city inputs, exactly one of which must be set.
    ///
    /// Blank strings count as not supplied.
    pub fn from_parts(postal_code: Option<&str>, city: Option<&str>) -> Result<Self, ProximityError> {
        let postal_code = postal_code.map(str::trim).filter(|s| !s.is_empty());
        let city = city.map(str::trim).filter(|s| !s.is_empty());

        match (postal_code, city) {
            (Some(pc), None) => Ok(Reference::PostalCode(pc.to_string())),
            (None, Some(city)) => Ok(Reference::City(city.to_string())),
            (Some(_), Some(_)) => Err(ProximityError::InvalidArgument(
                "supply either a postal code or a city, not both".to_string(),
            )),
            (None, None) => Err(ProximityError::InvalidArgument(
                "no reference postal code or city supplied".to_string(),
            )),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reference::PostalCode(s) | Reference::City(s) | Reference::Any(s) => s,
        }
    }
}

impl From<&str> for Reference {
    fn from(s: &str) -> Self {
        Reference::Any(s.to_string())
    }
}

impl From<String> for Reference {
    fn from(s: String) -> Self {
        Reference::Any(s)
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::PostalCode(s) => write!(f, "postal code {}", s),
            Reference::City(s) => write!(f, "city {}", s),
            Reference::Any(s) => write!(f, "{}", s),
        }
    }
}

/// Which coordinate stands for a city that owns several postal codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityResolution {
    /// Coordinate of the first record of the city in dataset order
    #[default]
    FirstMatch,
    /// Mean of all geocoded records of the city
    Centroid,
}

/// A reference after resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReference {
    /// The reference as given
    pub query: String,
    /// Postal code whose coordinate was used, if a single record was picked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub coordinate: Coordinate,
}

fn from_record(query: &str, record: &PostalCodeRecord) -> Result<ResolvedReference, ProximityError> {
    let coordinate = record
        .coordinate
        .ok_or_else(|| ProximityError::UnresolvedCoordinate(record.postal_code.clone()))?;
    Ok(ResolvedReference {
        query: query.to_string(),
        postal_code: Some(record.postal_code.clone()),
        coordinate,
    })
}

fn resolve_city(
    dataset: &GeoDataset,
    city: &str,
    policy: CityResolution,
) -> Result<ResolvedReference, ProximityError> {
    match policy {
        CityResolution::FirstMatch => {
            let record = dataset
                .first_in_city(city)
                .ok_or_else(|| ProximityError::ReferenceNotFound(city.to_string()))?;
            from_record(city, record)
        }
        CityResolution::Centroid => {
            let mut matched = 0usize;
            let mut geocoded = 0usize;
            let (mut lat_sum, mut lon_sum) = (0.0, 0.0);
            for record in dataset.in_city(city) {
                matched += 1;
                if let Some(c) = record.coordinate {
                    geocoded += 1;
                    lat_sum += c.lat;
                    lon_sum += c.lon;
                }
            }

            if matched == 0 {
                return Err(ProximityError::ReferenceNotFound(city.to_string()));
            }
            if geocoded == 0 {
                return Err(ProximityError::UnresolvedCoordinate(city.to_string()));
            }

            let n = geocoded as f64;
            Ok(ResolvedReference {
                query: city.to_string(),
                postal_code: None,
                coordinate: Coordinate::new(lat_sum / n, lon_sum / n),
            })
        }
    }
}

/// Resolve a reference against the dataset
pub fn resolve(
    dataset: &GeoDataset,
    reference: &Reference,
    policy: CityResolution,
) -> Result<ResolvedReference, ProximityError> {
    match reference {
        Reference::PostalCode(code) => {
            let record = dataset
                .get(code)
                .ok_or_else(|| ProximityError::ReferenceNotFound(code.clone()))?;
            from_record(code, record)
        }
        Reference::City(city) => resolve_city(dataset, city, policy),
        Reference::Any(text) => match dataset.get(text) {
            Some(record) => from_record(text, record),
            None => resolve_city(dataset, text, policy),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> GeoDataset {
        GeoDataset::from_records(vec![
            PostalCodeRecord::new("73432", "Aalen", None),
            PostalCodeRecord::geocoded("73430", "Aalen", 48.80, 10.00),
            PostalCodeRecord::geocoded("73431", "Aalen", 48.90, 10.20),
            PostalCodeRecord::geocoded("10115", "Berlin", 52.5321, 13.3846),
            PostalCodeRecord::new("99999", "Ghost", None),
            // A city literally named like a postal code
            PostalCodeRecord::geocoded("55555", "10115", 0.0, 0.0),
        ])
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            Reference::from_parts(Some("10115"), None),
            Ok(Reference::PostalCode("10115".to_string()))
        );
        assert_eq!(
            Reference::from_parts(None, Some("Berlin")),
            Ok(Reference::City("Berlin".to_string()))
        );
        assert!(matches!(
            Reference::from_parts(Some("10115"), Some("Berlin")),
            Err(ProximityError::InvalidArgument(_))
        ));
        assert!(matches!(
            Reference::from_parts(None, None),
            Err(ProximityError::InvalidArgument(_))
        ));
        assert!(matches!(
            Reference::from_parts(Some("  "), None),
            Err(ProximityError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reference_from_json() {
        let bare: Reference = serde_json::from_str("\"10115\"").unwrap();
        assert_eq!(bare, Reference::Any("10115".to_string()));

        let city: Reference = serde_json::from_str(r#"{"city": "Berlin"}"#).unwrap();
        assert_eq!(city, Reference::City("Berlin".to_string()));

        let code: Reference = serde_json::from_str(r#"{"postal_code": "10115"}"#).unwrap();
        assert_eq!(code, Reference::PostalCode("10115".to_string()));

        assert!(serde_json::from_str::<Reference>(r#"{"street": "Unter den Linden"}"#).is_err());
        assert!(serde_json::from_str::<Reference>("10115").is_err());
    }

    #[test]
    fn test_postal_code_wins_over_city() {
        let ds = dataset();
        let resolved = resolve(&ds, &"10115".into(), CityResolution::FirstMatch).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(52.5321, 13.3846));

        let by_city = resolve(
            &ds,
            &Reference::City("10115".to_string()),
            CityResolution::FirstMatch,
        )
        .unwrap();
        assert_eq!(by_city.postal_code.as_deref(), Some("55555"));
    }

    #[test]
    fn test_first_match_reports_missing_coordinate() {
        // First Aalen record is not geocoded
        let ds = dataset();
        assert_eq!(
            resolve(&ds, &"Aalen".into(), CityResolution::FirstMatch),
            Err(ProximityError::UnresolvedCoordinate("73432".to_string()))
        );
    }

    #[test]
    fn test_centroid_skips_missing_coordinates() {
        let ds = dataset();
        let resolved = resolve(&ds, &"Aalen".into(), CityResolution::Centroid).unwrap();
        assert!(resolved.postal_code.is_none());
        assert!((resolved.coordinate.lat - 48.85).abs() < 1e-12);
        assert!((resolved.coordinate.lon - 10.10).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_without_coordinates() {
        let ds = dataset();
        assert_eq!(
            resolve(&ds, &"Ghost".into(), CityResolution::Centroid),
            Err(ProximityError::UnresolvedCoordinate("Ghost".to_string()))
        );
    }

    #[test]
    fn test_postal_code_reference_does_not_fall_back_to_city() {
        let ds = dataset();
        assert_eq!(
            resolve(
                &ds,
                &Reference::PostalCode("Berlin".to_string()),
                CityResolution::FirstMatch
            ),
            Err(ProximityError::ReferenceNotFound("Berlin".to_string()))
        );
    }
}
