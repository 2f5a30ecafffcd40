//! Spherical geometry for proximity search.
//!
//! Distances use the Haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. Bounding boxes are always a superset of the circle
//! they enclose, so a box prefilter never drops a true match.

use crate::api::Position;

/// Mean Earth radius used for every distance in the API.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude used for the box prefilter.
pub const KM_PER_DEGREE: f64 = 111.12;

/// Below this `cos(lat)` the center is treated as a pole.
const POLE_COS_EPSILON: f64 = 1e-9;

/// Great-circle distance between two positions, in kilometres.
pub fn haversine_km(a: Position, b: Position) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h marginally outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Rectangular prefilter around a circle.
///
/// Longitude is expressed as one or two ranges: a box crossing the
/// antimeridian is split in two, and a box touching a pole spans the full
/// `[-180, 180]` range.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub lon_ranges: Vec<(f64, f64)>,
}

impl BoundingBox {
    /// Box enclosing every point within `radius_km` of `center`.
    ///
    /// `lat_delta = r / 111.12` and `lon_delta = r / (111.12 * cos(lat))`,
    /// widened to the exact longitude extent of the spherical cap when that
    /// is larger (it is, slightly, for large radii away from the equator).
    /// When `cos(lat)` vanishes or the latitude band reaches a pole the
    /// longitude range is unbounded.
    pub fn around(center: Position, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let south = center.lat - lat_delta;
        let north = center.lat + lat_delta;
        let cos_lat = center.lat.to_radians().cos();

        let full = vec![(-180.0, 180.0)];
        let lon_ranges = if south <= -90.0 || north >= 90.0 || cos_lat.abs() < POLE_COS_EPSILON {
            full
        } else {
            match lon_delta(radius_km, cos_lat) {
                Some(delta) if delta < 180.0 => split_antimeridian(center.lon - delta, center.lon + delta),
                _ => full,
            }
        };

        BoundingBox {
            min_lat: south.max(-90.0),
            max_lat: north.min(90.0),
            lon_ranges,
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && self
                .lon_ranges
                .iter()
                .any(|(west, east)| point.lon >= *west && point.lon <= *east)
    }

    pub fn spans_all_longitudes(&self) -> bool {
        self.lon_ranges == [(-180.0, 180.0)]
    }
}

/// Longitude half-width in degrees, or `None` when the cap contains a pole.
fn lon_delta(radius_km: f64, cos_lat: f64) -> Option<f64> {
    let planar = radius_km / (KM_PER_DEGREE * cos_lat);
    let angular = radius_km / EARTH_RADIUS_KM;
    let ratio = angular.sin() / cos_lat;
    if angular >= std::f64::consts::FRAC_PI_2 || ratio >= 1.0 {
        return None;
    }
    Some(planar.max(ratio.asin().to_degrees()))
}

fn split_antimeridian(west: f64, east: f64) -> Vec<(f64, f64)> {
    if west < -180.0 {
        vec![(west + 360.0, 180.0), (-180.0, east)]
    } else if east > 180.0 {
        vec![(west, 180.0), (-180.0, east - 360.0)]
    } else {
        vec![(west, east)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_short_hop() {
        let center = Position::new(25.04, 121.50);
        let d = haversine_km(center, Position::new(25.041, 121.50));
        assert!((d - 0.1112).abs() < 0.001, "got {}", d);
    }

    #[test]
    fn test_haversine_ten_km_east() {
        let d = haversine_km(Position::new(25.04, 121.50), Position::new(25.04, 121.60));
        assert!((d - 10.07).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn test_haversine_zero_and_antipodal() {
        let p = Position::new(10.0, 20.0);
        assert_eq!(haversine_km(p, p), 0.0);
        let d = haversine_km(Position::new(0.0, 0.0), Position::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_box_deltas_near_equator() {
        let bbox = BoundingBox::around(Position::new(0.0, 10.0), 111.12);
        assert!((bbox.max_lat - 1.0).abs() < 1e-9);
        assert!((bbox.min_lat + 1.0).abs() < 1e-9);
        assert_eq!(bbox.lon_ranges.len(), 1);
        let (west, east) = bbox.lon_ranges[0];
        assert!((west - 9.0).abs() < 1e-6);
        assert!((east - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_at_pole_spans_all_longitudes() {
        let bbox = BoundingBox::around(Position::new(90.0, 0.0), 5.0);
        assert!(bbox.spans_all_longitudes());
        assert_eq!(bbox.max_lat, 90.0);

        let near_pole = BoundingBox::around(Position::new(89.99, 45.0), 5.0);
        assert!(near_pole.spans_all_longitudes());
    }

    #[test]
    fn test_box_splits_at_antimeridian() {
        let bbox = BoundingBox::around(Position::new(0.0, 179.9), 50.0);
        assert_eq!(bbox.lon_ranges.len(), 2);
        assert!(bbox.contains(Position::new(0.0, -179.9)));
        assert!(bbox.contains(Position::new(0.0, 179.95)));
        assert!(!bbox.contains(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_box_encloses_large_circle_at_high_latitude() {
        let center = Position::new(60.0, 10.0);
        let radius = 500.0;
        let bbox = BoundingBox::around(center, radius);
        // Sweep the circle boundary just inside the radius.
        for step in 0..360 {
            let bearing = (step as f64).to_radians();
            let point = destination(center, bearing, radius * 0.999);
            assert!(bbox.contains(point), "missed {:?}", point);
        }
    }

    fn destination(start: Position, bearing: f64, distance_km: f64) -> Position {
        let d = distance_km / EARTH_RADIUS_KM;
        let lat1 = start.lat.to_radians();
        let lon1 = start.lon.to_radians();
        let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());
        Position::new(lat2.to_degrees(), lon2.to_degrees())
    }
}
