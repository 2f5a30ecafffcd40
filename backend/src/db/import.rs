//! Bulk replace of the attraction collection from a JSON export.
//!
//! Import is the only write path: drop, insert, rebuild indexes. Documents
//! get a stable `_id` derived from their source identity so that re-imports
//! of the same export keep the same identifiers.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_json::{json, Map, Value};

use super::query::{IndexSpec, RawDocument, ID_FIELD};
use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::services::normalize::{read_position, stored_paths};

/// Field carrying the GeoJSON point used by the geospatial index.
pub const GEO_FIELD: &str = "location";

/// Keys, in priority order, that carry a source identity.
const SOURCE_ID_KEYS: &[&str] = &["AttractionID", "attractionId", "id"];

/// Top-level keys that may wrap the record array of an export.
const WRAPPER_KEYS: &[&str] = &["Attractions", "attractions", "data"];

/// Result of a bulk replace.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported {
        count: usize,
        imported_at: DateTime<Utc>,
    },
    /// The input held no records; the existing collection was left untouched.
    NoData,
}

/// Indexes declared after every import.
pub fn default_indexes(geo_index: bool) -> Vec<IndexSpec> {
    let text_fields = stored_paths("name")
        .into_iter()
        .chain(stored_paths("description"));
    let mut indexes = vec![
        IndexSpec::text(text_fields),
        IndexSpec::ascending("classes"),
        IndexSpec::ascending("postalAddress.city"),
        IndexSpec::ascending("postalAddress.addressRegion"),
        IndexSpec::ascending("isAccessibleForFree"),
        IndexSpec::ascending("position"),
    ];
    if geo_index {
        indexes.push(IndexSpec::geo(GEO_FIELD));
    }
    indexes
}

/// Declare the default indexes on `repository`, returning their names.
pub async fn ensure_indexes(
    repository: &dyn FullRepository,
    geo_index: bool,
) -> RepositoryResult<Vec<String>> {
    let mut names = Vec::new();
    for index in default_indexes(geo_index) {
        names.push(repository.create_index(index).await?);
    }
    Ok(names)
}

/// Give a raw export record its store identity and GeoJSON location.
///
/// `_id` is kept when present, with an extended-JSON `{"$oid": ...}` wrapper
/// flattened to its hex string, else taken from the source identity, else a
/// fresh UUID. Non-object values are returned unchanged for the store to
/// reject.
pub fn prepare_document(mut doc: RawDocument) -> RawDocument {
    let position = read_position(&doc);
    if let Some(map) = doc.as_object_mut() {
        if let Some(oid) = map.get(ID_FIELD).and_then(object_id) {
            map.insert(ID_FIELD.to_string(), Value::String(oid));
        }
        if map.get(ID_FIELD).map_or(true, Value::is_null) {
            let id = source_identity(map).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            map.insert(ID_FIELD.to_string(), Value::String(id));
        }
        if let (Some(p), false) = (position, map.contains_key(GEO_FIELD)) {
            map.insert(
                GEO_FIELD.to_string(),
                json!({"type": "Point", "coordinates": [p.lon, p.lat]}),
            );
        }
    }
    doc
}

/// The hex string of an extended-JSON object id.
pub(crate) fn object_id(value: &Value) -> Option<String> {
    match value.as_object()?.get("$oid")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn source_identity(map: &Map<String, Value>) -> Option<String> {
    SOURCE_ID_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Replace the whole collection with `documents` and rebuild indexes.
pub async fn replace_attractions(
    repository: &dyn FullRepository,
    documents: Vec<RawDocument>,
    geo_index: bool,
) -> RepositoryResult<ImportOutcome> {
    if documents.is_empty() {
        warn!("Import input holds no attractions; keeping the current collection");
        return Ok(ImportOutcome::NoData);
    }

    let prepared: Vec<RawDocument> = documents.into_iter().map(prepare_document).collect();
    let count = repository
        .replace_all(prepared)
        .await
        .map_err(|e| e.with_operation("replace_attractions"))?;
    let indexes = ensure_indexes(repository, geo_index).await?;
    info!(
        "Imported {} attractions, indexes: {}",
        count,
        indexes.join(", ")
    );

    Ok(ImportOutcome::Imported {
        count,
        imported_at: Utc::now(),
    })
}

/// Parse an export: a top-level array of records, or an object wrapping one
/// under `Attractions`, `attractions` or `data`.
pub fn parse_export(content: &str) -> RepositoryResult<Vec<RawDocument>> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                RepositoryError::write_with_context(
                    "export object has no attraction array",
                    ErrorContext::new("parse_export")
                        .with_details(format!("expected one of {:?}", WRAPPER_KEYS)),
                )
            }),
        _ => Err(RepositoryError::write_with_context(
            "export must be a JSON array or object",
            ErrorContext::new("parse_export"),
        )),
    }
}

/// Read `path` and bulk replace the collection with its records.
pub async fn import_file<P: AsRef<Path>>(
    repository: &dyn FullRepository,
    path: P,
    geo_index: bool,
) -> RepositoryResult<ImportOutcome> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        RepositoryError::configuration(format!(
            "Failed to read seed file {}: {}",
            path.display(),
            e
        ))
    })?;
    let documents = parse_export(&content)?;
    info!("Read {} records from {}", documents.len(), path.display());
    replace_attractions(repository, documents, geo_index).await
}
