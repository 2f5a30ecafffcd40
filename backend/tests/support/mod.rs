//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use attractions_backend::db::{LocalRepository, MaintenanceRepository};
use attractions_backend::services::AttractionService;

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A connected store holding `docs`.
pub async fn store_with(docs: Vec<Value>) -> LocalRepository {
    let repo = LocalRepository::connected();
    repo.replace_all(docs).await.expect("seed store");
    repo
}

/// Query façade over a connected store holding `docs`.
pub async fn service_with(docs: Vec<Value>) -> AttractionService {
    AttractionService::new(Arc::new(store_with(docs).await))
}

/// Small catalog mixing both stored shapes around Taipei.
pub fn mixed_catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "longshan",
            "AttractionID": "C1_001",
            "AttractionName": "Longshan Temple",
            "Description": "Historic temple, night market nearby",
            "AttractionClasses": [1, 4],
            "PostalAddress": {"City": "Taipei City", "StreetAddress": "No. 211, Guangzhou St."},
            "PositionLat": 25.0372,
            "PositionLon": 121.4999,
            "IsAccessibleForFree": 1
        }),
        json!({
            "_id": "museum",
            "name": "National Palace Museum",
            "description": "Imperial collection",
            "classes": [2],
            "postalAddress": {"addressRegion": "Taipei City"},
            "position": {"lat": 25.1024, "lon": 121.5485},
            "isAccessibleForFree": false
        }),
        json!({
            "_id": "tower",
            "attractionName": "Taipei 101",
            "description": "Skyscraper observatory with night views",
            "attractionClasses": [3],
            "postalAddress": {"city": "Taipei City"},
            "location": {"type": "Point", "coordinates": [121.5645, 25.0339]},
            "isAccessibleForFree": 0
        }),
        json!({
            "_id": "lake",
            "AttractionName": "Sun Moon Lake",
            "AttractionClasses": [1],
            "PostalAddress": {"City": "Nantou County"},
            "PositionLat": 23.8571,
            "PositionLon": 120.9153,
            "IsAccessibleForFree": true
        }),
        json!({
            "_id": "unmapped",
            "name": "Unmapped Trail",
            "classes": [5],
            "isAccessibleForFree": true
        }),
    ]
}
