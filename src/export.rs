//! GeoJSON export of query results for map rendering.

use geo_types::Point;
use serde::Serialize;

use crate::dataset::GeoDataset;
use crate::geodesy::{haversine_km, Geodesy};
use crate::models::{Coordinate, PostalCodeRecord};
use crate::proximity::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reference,
    Nearby,
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geo_type: String,
    pub coordinates: [f64; 2], // [lon, lat]
}

#[derive(Debug, Serialize)]
pub struct Properties {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
}

impl Geometry {
    fn point(c: Coordinate) -> Self {
        let p: Point<f64> = c.into();
        Self {
            geo_type: "Point".to_string(),
            coordinates: [p.x(), p.y()],
        }
    }
}

/// Matched records with their distance to the reference, nearest first
pub fn with_distances<'a>(
    dataset: &'a GeoDataset,
    result: &QueryResult,
    geodesy: &Geodesy,
) -> Vec<(&'a PostalCodeRecord, f64)> {
    let center = result.reference.coordinate;
    let mut ranked: Vec<(&PostalCodeRecord, f64)> = result
        .iter()
        .filter_map(|code| dataset.get(code))
        .filter_map(|r| {
            r.coordinate
                .map(|c| (r, haversine_km(center, c, geodesy.earth_radius_km)))
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| a.0.postal_code.cmp(&b.0.postal_code))
    });
    ranked
}

/// Reference point plus one point per matched postal code
pub fn to_feature_collection(
    dataset: &GeoDataset,
    result: &QueryResult,
    geodesy: &Geodesy,
) -> FeatureCollection {
    let reference = &result.reference;
    let reference_city = reference
        .postal_code
        .as_deref()
        .and_then(|pc| dataset.get(pc))
        .map(|r| r.city.clone());

    let mut features = vec![Feature {
        feature_type: "Feature".to_string(),
        geometry: Geometry::point(reference.coordinate),
        properties: Properties {
            role: Role::Reference,
            postal_code: reference.postal_code.clone(),
            city: reference_city,
            distance_km: 0.0,
            radius_km: Some(result.radius_km),
        },
    }];

    features.extend(
        with_distances(dataset, result, geodesy)
            .into_iter()
            .filter_map(|(record, distance_km)| {
                record.coordinate.map(|c| Feature {
                    feature_type: "Feature".to_string(),
                    geometry: Geometry::point(c),
                    properties: Properties {
                        role: Role::Nearby,
                        postal_code: Some(record.postal_code.clone()),
                        city: Some(record.city.clone()),
                        distance_km,
                        radius_km: None,
                    },
                })
            }),
    );

    FeatureCollection {
        collection_type: "FeatureCollection".to_string(),
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::find_nearby_by_distance;

    fn dataset() -> GeoDataset {
        GeoDataset::from_records(vec![
            PostalCodeRecord::geocoded("20095", "Hamburg", 53.5511, 9.9937),
            PostalCodeRecord::geocoded("14467", "Potsdam", 52.3989, 13.0657),
            PostalCodeRecord::geocoded("10115", "Berlin", 52.5321, 13.3846),
        ])
    }

    #[test]
    fn test_with_distances_sorted() {
        let ds = dataset();
        let result = find_nearby_by_distance(&ds, &"10115".into(), 300.0).unwrap();
        let ranked = with_distances(&ds, &result, &Geodesy::WGS84);
        let codes: Vec<&str> = ranked.iter().map(|(r, _)| r.postal_code.as_str()).collect();
        assert_eq!(codes, vec!["10115", "14467", "20095"]);
        assert_eq!(ranked[0].1, 0.0);
    }

    #[test]
    fn test_feature_collection_json() {
        let ds = dataset();
        let result = find_nearby_by_distance(&ds, &"Berlin".into(), 50.0).unwrap();
        let fc = to_feature_collection(&ds, &result, &Geodesy::WGS84);
        let json = serde_json::to_value(&fc).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 3);

        assert_eq!(features[0]["properties"]["role"], "reference");
        assert_eq!(features[0]["properties"]["city"], "Berlin");
        assert_eq!(features[0]["properties"]["radius_km"], 50.0);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 13.3846);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 52.5321);

        assert_eq!(features[2]["properties"]["role"], "nearby");
        assert_eq!(features[2]["properties"]["postal_code"], "14467");
        assert!(features[2]["properties"].get("radius_km").is_none());
    }
}
