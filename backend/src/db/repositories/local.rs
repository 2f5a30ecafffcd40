//! In-memory local document store.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing, local development and small seeded
//! deployments. Documents are kept in insertion order in a `Vec`, and
//! predicates are evaluated in-process with the same semantics a document
//! database applies.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use serde_json::Value;

use crate::api::Position;
use crate::db::query::{
    lookup, FindOptions, IndexKind, IndexSpec, NearQuery, Predicate, RawDocument,
    ScoredDocument, SortSpec, StoreCapabilities, ID_FIELD,
};
use crate::db::import::object_id;
use crate::db::repository::*;
use crate::services::geo::haversine_km;

const COLLECTION: &str = "attractions";

/// Connection lifecycle of the store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed but never connected.
    Disconnected,
    Connected,
    /// Closed at shutdown; every operation is rejected.
    Closed,
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use attractions_backend::db::repositories::LocalRepository;
/// use attractions_backend::db::repository::{DocumentRepository, MaintenanceRepository};
/// use attractions_backend::db::query::Predicate;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// runtime.block_on(async {
///     let repo = LocalRepository::new();
///     repo.connect().await.unwrap();
///     repo.replace_all(vec![serde_json::json!({"_id": "a", "name": "A"})]).await.unwrap();
///     assert_eq!(repo.count(&Predicate::All).await.unwrap(), 1);
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    documents: Vec<RawDocument>,
    indexes: Vec<IndexSpec>,
    state: ConnectionState,
}

impl LocalRepository {
    /// Create a new, not yet connected, empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                documents: Vec::new(),
                indexes: Vec::new(),
                state: ConnectionState::Disconnected,
            })),
        }
    }

    /// Create an empty store that is already connected.
    pub fn connected() -> Self {
        let repo = Self::new();
        repo.data.write().state = ConnectionState::Connected;
        repo
    }

    /// Append documents exactly as given, bypassing write validation.
    ///
    /// This is a helper for setting up data, including malformed records
    /// that `replace_all` would reject or repair.
    pub fn insert_documents_impl(&self, documents: Vec<RawDocument>) -> usize {
        let mut data = self.data.write();
        let count = documents.len();
        data.documents.extend(documents);
        count
    }

    pub fn state(&self) -> ConnectionState {
        self.data.read().state
    }

    /// Get the number of documents stored.
    pub fn document_count(&self) -> usize {
        self.data.read().documents.len()
    }

    /// Names of the declared indexes.
    pub fn index_names(&self) -> Vec<String> {
        self.data.read().indexes.iter().map(IndexSpec::name).collect()
    }

    /// Helper to check the connection and return an error if unusable.
    fn check_connected(&self, operation: &str) -> RepositoryResult<()> {
        match self.data.read().state {
            ConnectionState::Connected => Ok(()),
            state => Err(RepositoryError::connection_with_context(
                "store not connected",
                ErrorContext::new(operation)
                    .with_entity(COLLECTION)
                    .with_details(format!("state={:?}", state)),
            )),
        }
    }

    fn text_fields(data: &LocalData) -> Option<Vec<String>> {
        data.indexes
            .iter()
            .find(|i| i.kind == IndexKind::Text)
            .map(|i| i.fields.clone())
    }

    fn has_geo_index(data: &LocalData, field: &str) -> bool {
        data.indexes
            .iter()
            .any(|i| i.kind == IndexKind::Geo2dSphere && i.fields.iter().any(|f| f == field))
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply skip and limit to an already ordered result set.
fn paginate<T>(items: Vec<T>, skip: usize, limit: Option<usize>) -> Vec<T> {
    let iter = items.into_iter().skip(skip);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

/// Relevance of a document for the query terms over the indexed fields:
/// the number of case-insensitive term occurrences.
fn text_score(doc: &RawDocument, fields: &[String], terms: &[String]) -> f64 {
    let mut score = 0usize;
    for field in fields {
        for value in lookup(doc, field) {
            let texts: Vec<&str> = match value {
                Value::String(s) => vec![s.as_str()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            for text in texts {
                let text = text.to_lowercase();
                score += terms.iter().map(|t| text.matches(t.as_str()).count()).sum::<usize>();
            }
        }
    }
    score as f64
}

/// Read an indexed geo field: GeoJSON point, `{lat, lon}` object or `[lon, lat]` pair.
fn point_at(doc: &RawDocument, field: &str) -> Option<Position> {
    let value = lookup(doc, field).into_iter().next()?;
    let position = match value {
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("Point") => {
            let coords = map.get("coordinates")?.as_array()?;
            Position::new(coords.get(1)?.as_f64()?, coords.first()?.as_f64()?)
        }
        Value::Object(map) => Position::new(map.get("lat")?.as_f64()?, map.get("lon")?.as_f64()?),
        Value::Array(pair) if pair.len() == 2 => {
            Position::new(pair[1].as_f64()?, pair[0].as_f64()?)
        }
        _ => return None,
    };
    position.is_valid().then_some(position)
}

fn id_of(doc: &RawDocument) -> Option<String> {
    match doc.get(ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        oid @ Value::Object(_) => object_id(oid),
        _ => None,
    }
}

#[async_trait]
impl DocumentRepository for LocalRepository {
    async fn capabilities(&self) -> RepositoryResult<StoreCapabilities> {
        self.check_connected("capabilities")?;
        let data = self.data.read();
        Ok(StoreCapabilities {
            text_score: Self::text_fields(&data).is_some(),
            geo_field: data
                .indexes
                .iter()
                .find(|i| i.kind == IndexKind::Geo2dSphere)
                .and_then(|i| i.fields.first().cloned()),
        })
    }

    async fn find_many(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> RepositoryResult<Vec<RawDocument>> {
        self.check_connected("find_many")?;
        let data = self.data.read();
        let mut matched: Vec<&RawDocument> =
            data.documents.iter().filter(|d| predicate.matches(d)).collect();

        if let Some(sort @ SortSpec::Ascending(_)) = &options.sort {
            // Stable sort: ties keep insertion order.
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        debug!("find_many matched {} documents", matched.len());
        Ok(paginate(matched, options.skip, options.limit)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> RepositoryResult<u64> {
        self.check_connected("count")?;
        let data = self.data.read();
        Ok(data.documents.iter().filter(|d| predicate.matches(d)).count() as u64)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<RawDocument>> {
        self.check_connected("find_by_id")?;
        let data = self.data.read();
        Ok(data
            .documents
            .iter()
            .find(|d| id_of(d).as_deref() == Some(id))
            .cloned())
    }

    async fn text_search(
        &self,
        query: &str,
        options: &FindOptions,
    ) -> RepositoryResult<Vec<ScoredDocument>> {
        self.check_connected("text_search")?;
        let data = self.data.read();
        let fields = Self::text_fields(&data).ok_or_else(|| {
            RepositoryError::query_with_context(
                "text index required for text search",
                ErrorContext::new("text_search").with_entity(COLLECTION),
            )
        })?;
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

        let mut hits: Vec<(&RawDocument, f64)> = data
            .documents
            .iter()
            .map(|d| (d, text_score(d, &fields, &terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        match &options.sort {
            Some(sort @ SortSpec::TextScore(_)) => hits.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| sort.compare(a.0, b.0))
            }),
            Some(sort @ SortSpec::Ascending(_)) => hits.sort_by(|a, b| sort.compare(a.0, b.0)),
            None => {}
        }

        Ok(paginate(hits, options.skip, options.limit)
            .into_iter()
            .map(|(document, score)| ScoredDocument {
                document: document.clone(),
                score,
            })
            .collect())
    }

    async fn count_text(&self, query: &str) -> RepositoryResult<u64> {
        let hits = self.text_search(query, &FindOptions::default()).await?;
        Ok(hits.len() as u64)
    }
}

#[async_trait]
impl GeoRepository for LocalRepository {
    async fn find_near(&self, query: &NearQuery) -> RepositoryResult<Vec<RawDocument>> {
        self.check_connected("find_near")?;
        let data = self.data.read();
        if !Self::has_geo_index(&data, &query.field) {
            return Err(RepositoryError::query_with_context(
                "geospatial index required for near query",
                ErrorContext::new("find_near")
                    .with_entity(COLLECTION)
                    .with_details(format!("field={}", query.field)),
            ));
        }

        let max_km = query.max_distance_m / 1000.0;
        let mut hits: Vec<(&RawDocument, f64)> = data
            .documents
            .iter()
            .filter_map(|d| point_at(d, &query.field).map(|p| (d, haversine_km(query.center, p))))
            .filter(|(_, distance)| *distance <= max_km)
            .collect();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        Ok(paginate(hits, query.skip, query.limit)
            .into_iter()
            .map(|(d, _)| d.clone())
            .collect())
    }

    async fn count_near(&self, query: &NearQuery) -> RepositoryResult<u64> {
        let unbounded = NearQuery {
            skip: 0,
            limit: None,
            ..query.clone()
        };
        Ok(self.find_near(&unbounded).await?.len() as u64)
    }
}

#[async_trait]
impl MaintenanceRepository for LocalRepository {
    async fn connect(&self) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if data.state != ConnectionState::Connected {
            info!("Local document store connected ({} documents)", data.documents.len());
            data.state = ConnectionState::Connected;
        }
        Ok(())
    }

    async fn close(&self) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if data.state == ConnectionState::Connected {
            info!("Local document store closed");
        }
        data.state = ConnectionState::Closed;
        Ok(())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().state == ConnectionState::Connected)
    }

    async fn replace_all(&self, documents: Vec<RawDocument>) -> RepositoryResult<usize> {
        self.check_connected("replace_all")?;

        // Validate the whole batch before dropping the old collection.
        let mut prepared = Vec::with_capacity(documents.len());
        let mut seen = std::collections::HashSet::new();
        for (position, mut doc) in documents.into_iter().enumerate() {
            let Some(map) = doc.as_object_mut() else {
                return Err(RepositoryError::write_with_context(
                    "document is not a JSON object",
                    ErrorContext::new("replace_all")
                        .with_entity(COLLECTION)
                        .with_details(format!("position={}", position)),
                ));
            };
            if !map.contains_key(ID_FIELD) {
                map.insert(
                    ID_FIELD.to_string(),
                    Value::String(uuid::Uuid::new_v4().to_string()),
                );
            }
            let id = id_of(&doc).ok_or_else(|| {
                RepositoryError::write_with_context(
                    "document identifier must be a string, number or object id",
                    ErrorContext::new("replace_all")
                        .with_entity(COLLECTION)
                        .with_details(format!("position={}", position)),
                )
            })?;
            if !seen.insert(id.clone()) {
                return Err(RepositoryError::write_with_context(
                    "duplicate document identifier",
                    ErrorContext::new("replace_all")
                        .with_entity(COLLECTION)
                        .with_entity_id(id),
                ));
            }
            prepared.push(doc);
        }

        let mut data = self.data.write();
        let inserted = prepared.len();
        data.documents = prepared;
        data.indexes.clear();
        info!("Replaced {} collection with {} documents", COLLECTION, inserted);
        Ok(inserted)
    }

    async fn create_index(&self, index: IndexSpec) -> RepositoryResult<String> {
        self.check_connected("create_index")?;
        let name = index.name();
        let mut data = self.data.write();
        if index.kind == IndexKind::Text
            && data
                .indexes
                .iter()
                .any(|i| i.kind == IndexKind::Text && *i != index)
        {
            return Err(RepositoryError::query_with_context(
                "only one text index is allowed per collection",
                ErrorContext::new("create_index").with_entity(COLLECTION).with_details(name),
            ));
        }
        if !data.indexes.contains(&index) {
            debug!("Created index {}", name);
            data.indexes.push(index);
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<RawDocument> {
        vec![
            json!({"_id": "c", "name": "C", "description": "tea house by the river"}),
            json!({"_id": "a", "name": "A", "description": "river walk, river view"}),
            json!({"_id": "b", "name": "B", "description": "night market"}),
        ]
    }

    async fn seeded() -> LocalRepository {
        let repo = LocalRepository::connected();
        repo.replace_all(sample()).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_health_check_follows_lifecycle() {
        let repo = LocalRepository::new();
        assert!(!repo.health_check().await.unwrap());
        repo.connect().await.unwrap();
        assert!(repo.health_check().await.unwrap());
        repo.close().await.unwrap();
        assert!(!repo.health_check().await.unwrap());
        assert_eq!(repo.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let repo = LocalRepository::new();
        let err = repo.count(&Predicate::All).await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(err.context().operation.as_deref(), Some("count"));
    }

    #[tokio::test]
    async fn test_find_many_sorts_then_paginates() {
        let repo = seeded().await;
        let options = FindOptions::new(1, 1).sorted(SortSpec::ascending(["name"]));
        let docs = repo.find_many(&Predicate::All, &options).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "B");
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let repo = seeded().await;
        assert!(repo.find_by_id("a").await.unwrap().is_some());
        assert!(repo.find_by_id("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_object_id() {
        let repo = LocalRepository::connected();
        let oid = "65a1f0c2e4b0a1b2c3d4e5f6";
        repo.replace_all(vec![json!({"_id": {"$oid": oid}, "name": "Wrapped"})])
            .await
            .unwrap();
        let doc = repo.find_by_id(oid).await.unwrap().unwrap();
        assert_eq!(doc["name"], "Wrapped");

        let err = repo
            .replace_all(vec![json!({"_id": {"other": 1}})])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("object id"));
    }

    #[tokio::test]
    async fn test_text_search_requires_index_and_ranks() {
        let repo = seeded().await;
        assert!(repo.text_search("river", &FindOptions::default()).await.is_err());

        repo.create_index(IndexSpec::text(["name", "description"])).await.unwrap();
        let options = FindOptions::default().sorted(SortSpec::relevance(["name"]));
        let hits = repo.text_search("river", &options).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document["_id"], "a");
        assert!(hits[0].score > hits[1].score);
        assert_eq!(repo.count_text("river").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_drops_indexes_and_assigns_ids() {
        let repo = seeded().await;
        repo.create_index(IndexSpec::ascending("classes")).await.unwrap();
        assert_eq!(repo.index_names(), vec!["classes_1".to_string()]);

        let inserted = repo.replace_all(vec![json!({"name": "no id"})]).await.unwrap();
        assert_eq!(inserted, 1);
        assert!(repo.index_names().is_empty());
        let docs = repo.find_many(&Predicate::All, &FindOptions::default()).await.unwrap();
        assert!(docs[0]["_id"].is_string());
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicates_without_dropping() {
        let repo = seeded().await;
        let err = repo
            .replace_all(vec![json!({"_id": "x"}), json!({"_id": "x"})])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::WriteError { .. }));
        assert_eq!(repo.document_count(), 3);
    }

    #[tokio::test]
    async fn test_find_near_requires_geo_index() {
        let repo = LocalRepository::connected();
        repo.replace_all(vec![
            json!({"_id": "near", "location": {"type": "Point", "coordinates": [121.50, 25.041]}}),
            json!({"_id": "far", "location": {"type": "Point", "coordinates": [121.60, 25.04]}}),
            json!({"_id": "nowhere"}),
        ])
        .await
        .unwrap();

        let query = NearQuery {
            field: "location".into(),
            center: Position::new(25.04, 121.50),
            max_distance_m: 1000.0,
            skip: 0,
            limit: Some(10),
        };
        assert!(repo.find_near(&query).await.is_err());

        repo.create_index(IndexSpec::geo("location")).await.unwrap();
        let docs = repo.find_near(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["_id"], "near");
        assert_eq!(repo.count_near(&query).await.unwrap(), 1);
        assert_eq!(
            repo.capabilities().await.unwrap().geo_field.as_deref(),
            Some("location")
        );
    }
}
