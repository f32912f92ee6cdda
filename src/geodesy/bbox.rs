//! Rectangular lat/lon prefilter around a center point.

use serde::Serialize;

use super::Geodesy;
use crate::models::Coordinate;

/// Axis-aligned lat/lon rectangle.
///
/// Bounds are not clamped: near the poles or for huge radii they may exceed
/// ±90 / ±180, which simply leaves that axis unbounded. There is no
/// antimeridian wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box covering `radius_km` around `center`.
    ///
    /// Latitude span is `radius / km_per_degree`; longitude span divides
    /// further by `cos(lat)`, floored at `min_cos_latitude`. Each span is
    /// widened to the extent of the spherical cap of that radius when the
    /// cap reaches further, so every point of the circle is inside the box.
    pub fn around(center: Coordinate, radius_km: f64, geodesy: &Geodesy) -> Self {
        let cos_lat = center
            .lat
            .to_radians()
            .cos()
            .abs()
            .max(geodesy.min_cos_latitude);
        let (cap_lat, cap_lon) = cap_extent(center.lat, radius_km, cos_lat, geodesy);

        let lat_delta = (radius_km / geodesy.km_per_degree).max(cap_lat);
        let lon_delta = (radius_km / (geodesy.km_per_degree * cos_lat)).max(cap_lon);

        Self {
            min_lat: center.lat - lat_delta,
            max_lat: center.lat + lat_delta,
            min_lon: center.lon - lon_delta,
            max_lon: center.lon + lon_delta,
        }
    }

    /// Inclusive on every edge
    pub fn contains(&self, c: Coordinate) -> bool {
        self.min_lat <= c.lat
            && c.lat <= self.max_lat
            && self.min_lon <= c.lon
            && c.lon <= self.max_lon
    }

    /// Corners as `([min_lon, min_lat], [max_lon, max_lat])` for the R-tree
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        ([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }
}

/// Half spans in degrees of the spherical cap of `radius_km` around a latitude.
///
/// The longitude span is 360 once the cap touches a pole.
fn cap_extent(lat: f64, radius_km: f64, cos_lat: f64, geodesy: &Geodesy) -> (f64, f64) {
    let theta = radius_km / geodesy.earth_radius_km;
    let lat_delta = theta.to_degrees();
    let lon_delta = if lat.abs() + lat_delta >= 90.0 || theta.sin() >= cos_lat {
        360.0
    } else {
        (theta.sin() / cos_lat).asin().to_degrees()
    };
    (lat_delta, lon_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::distance;

    const BERLIN: Coordinate = Coordinate::new(52.5321, 13.3846);

    /// Point `distance_km` from `from` along `bearing` (radians) on the sphere
    fn destination(from: Coordinate, distance_km: f64, bearing: f64) -> Coordinate {
        let delta = distance_km / Geodesy::WGS84.earth_radius_km;
        let lat1 = from.lat.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
        let lon2 = from.lon.to_radians()
            + (bearing.sin() * delta.sin() * lat1.cos())
                .atan2(delta.cos() - lat1.sin() * lat2.sin());
        Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
    }

    #[test]
    fn test_box_spans() {
        let bbox = BoundingBox::around(BERLIN, 111.32, &Geodesy::WGS84);
        // One degree of latitude is 111.195 km on the mean sphere, so the cap wins
        let cap_lat = (111.32 / Geodesy::WGS84.earth_radius_km).to_degrees();
        assert!((bbox.max_lat - BERLIN.lat - cap_lat).abs() < 1e-9);
        assert!(bbox.max_lat - BERLIN.lat > 1.0);
        let cos = BERLIN.lat.to_radians().cos();
        assert!(bbox.max_lon - BERLIN.lon >= 1.0 / cos);
    }

    #[test]
    fn test_wider_km_per_degree_is_kept() {
        let geodesy = Geodesy {
            km_per_degree: 50.0,
            ..Geodesy::WGS84
        };
        let bbox = BoundingBox::around(BERLIN, 100.0, &geodesy);
        assert!((bbox.max_lat - BERLIN.lat - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_radius_is_a_point() {
        let bbox = BoundingBox::around(BERLIN, 0.0, &Geodesy::WGS84);
        assert_eq!(bbox.min_lat, BERLIN.lat);
        assert_eq!(bbox.max_lat, BERLIN.lat);
        assert!(bbox.contains(BERLIN));
    }

    #[test]
    fn test_pole_does_not_divide_by_zero() {
        let bbox = BoundingBox::around(Coordinate::new(90.0, 0.0), 10.0, &Geodesy::WGS84);
        assert!(bbox.min_lon.is_finite());
        assert!(bbox.max_lon.is_finite());
        assert!(bbox.max_lon > 180.0);
        assert!(bbox.max_lat > 90.0);
        // Out of range bounds act as unbounded
        assert!(bbox.contains(Coordinate::new(89.95, -170.0)));
    }

    #[test]
    fn test_points_inside_circle_are_inside_box() {
        let centers = [
            BERLIN,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(-60.0, 120.0),
            Coordinate::new(80.0, 10.0),
        ];
        for center in centers {
            for radius in [1.0, 50.0, 300.0, 1000.0] {
                let bbox = BoundingBox::around(center, radius, &Geodesy::WGS84);
                for step in 0..72 {
                    let bearing = (step as f64 * 5.0).to_radians();
                    for fraction in [0.5, 0.9, 0.999, 0.9999] {
                        let p = destination(center, radius * fraction, bearing);
                        if distance(center, p) < radius {
                            assert!(
                                bbox.contains(p),
                                "{} at {} km from {} outside {:?}",
                                p,
                                radius * fraction,
                                center,
                                bbox
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rim_point_due_north_is_inside() {
        let p = Coordinate::new(BERLIN.lat + 49.97 / 111.195, BERLIN.lon);
        assert!(distance(BERLIN, p) < 50.0);
        assert!(BoundingBox::around(BERLIN, 50.0, &Geodesy::WGS84).contains(p));
    }

    #[test]
    fn test_corner_is_outside_circle() {
        let radius = 50.0;
        let bbox = BoundingBox::around(BERLIN, radius, &Geodesy::WGS84);
        let corner = Coordinate::new(bbox.max_lat, bbox.max_lon);
        assert!(bbox.contains(corner));
        assert!(distance(BERLIN, corner) > radius);
    }
}
