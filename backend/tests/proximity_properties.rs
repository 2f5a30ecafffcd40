//! Property tests for proximity search: a record is returned iff its
//! Haversine distance from the center is within the radius.

mod support;

use proptest::prelude::*;
use serde_json::{json, Value};

use attractions_backend::api::Position;
use attractions_backend::services::geo::haversine_km;
use attractions_backend::services::{NearbyParams, PageRequest};

const TOLERANCE_KM: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Sample {
    center: Position,
    radius_km: f64,
    points: Vec<Option<(f64, f64)>>,
}

fn sample() -> impl Strategy<Value = Sample> {
    (
        -80.0..80.0f64,
        -180.0..180.0f64,
        0.5..200.0f64,
        prop::collection::vec(prop::option::weighted(0.9, (-3.0..3.0f64, -3.0..3.0f64)), 1..40),
    )
        .prop_map(|(lat, lon, radius_km, offsets)| Sample {
            center: Position::new(lat, lon),
            radius_km,
            points: offsets
                .into_iter()
                .map(|o| {
                    o.map(|(dlat, dlon)| {
                        let lat = (lat + dlat).clamp(-90.0, 90.0);
                        // Wrap across the antimeridian.
                        let mut lon = lon + dlon;
                        if lon > 180.0 {
                            lon -= 360.0;
                        } else if lon < -180.0 {
                            lon += 360.0;
                        }
                        (lat, lon)
                    })
                })
                .collect(),
        })
}

fn documents(points: &[Option<(f64, f64)>]) -> Vec<Value> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| match (p, i % 2) {
            (Some((lat, lon)), 0) => json!({"_id": format!("p{}", i), "name": format!("P{:03}", i), "position": {"lat": lat, "lon": lon}}),
            (Some((lat, lon)), _) => json!({"_id": format!("p{}", i), "AttractionName": format!("P{:03}", i), "PositionLat": lat, "PositionLon": lon}),
            (None, _) => json!({"_id": format!("p{}", i), "name": format!("P{:03}", i)}),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn nearby_returns_exactly_points_within_radius(s in sample()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let page = runtime.block_on(async {
            let service = support::service_with(documents(&s.points)).await;
            let params = NearbyParams::new(s.center.lon, s.center.lat, s.radius_km);
            service.nearby(params, PageRequest::new(1, 100)).await.unwrap()
        });

        let returned: Vec<String> = page.data.iter().map(|a| a.id.clone()).collect();
        for (i, p) in s.points.iter().enumerate() {
            let id = format!("p{}", i);
            match p {
                None => prop_assert!(!returned.contains(&id), "{} has no position", id),
                Some((lat, lon)) => {
                    let d = haversine_km(s.center, Position::new(*lat, *lon));
                    if d <= s.radius_km - TOLERANCE_KM {
                        prop_assert!(returned.contains(&id), "{} at {} km missing", id, d);
                    } else if d > s.radius_km + TOLERANCE_KM {
                        prop_assert!(!returned.contains(&id), "{} at {} km returned", id, d);
                    }
                }
            }
        }

        prop_assert_eq!(page.total as usize, page.data.len());
        let distances: Vec<f64> = page.data.iter().map(|a| a.distance_km.unwrap()).collect();
        prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(distances.iter().all(|d| *d <= s.radius_km));
    }
}
