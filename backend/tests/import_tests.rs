//! Bulk import of attraction exports into the store.

mod support;

use std::io::Write;
use std::sync::Arc;

use serde_json::json;

use attractions_backend::config::AppConfig;
use attractions_backend::db::{
    import_file, replace_attractions, DocumentRepository, ImportOutcome, LocalRepository,
    RepositoryError, RepositoryFactory,
};
use attractions_backend::services::{AttractionService, NearbyParams, PageRequest};

fn export_file(content: &serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.to_string().as_bytes()).unwrap();
    file
}

fn pascal_export() -> serde_json::Value {
    json!({
        "UpdateTime": "2024-01-01T00:00:00+08:00",
        "Attractions": [
            {
                "AttractionID": "C1_A",
                "AttractionName": "Longshan Temple",
                "AttractionClasses": [1],
                "PostalAddress": {"City": "Taipei City"},
                "PositionLat": 25.0372,
                "PositionLon": 121.4999
            },
            {
                "AttractionID": "C1_B",
                "AttractionName": "Sun Moon Lake",
                "PositionLat": 23.8571,
                "PositionLon": 120.9153
            }
        ]
    })
}

#[tokio::test]
async fn test_import_wrapped_export() {
    let repo = LocalRepository::connected();
    let file = export_file(&pascal_export());

    let outcome = import_file(&repo, file.path(), false).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::Imported { count: 2, .. }));

    // Source identities become store ids.
    let doc = repo.find_by_id("C1_A").await.unwrap().unwrap();
    assert_eq!(doc["location"]["coordinates"], json!([121.4999, 25.0372]));

    let service = AttractionService::new(Arc::new(repo));
    let single = service.by_id("C1_B").await.unwrap();
    assert_eq!(single.data.name, "Sun Moon Lake");
}

#[tokio::test]
async fn test_object_id_export_resolves_by_id() {
    let repo = LocalRepository::connected();
    let file = export_file(&json!([
        {"_id": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f6"}, "name": "Tamsui Old Street"}
    ]));
    import_file(&repo, file.path(), false).await.unwrap();

    let service = AttractionService::new(Arc::new(repo));
    let page = service.list(PageRequest::default()).await.unwrap();
    let id = page.data[0].id.clone();
    assert_eq!(id, "65a1f0c2e4b0a1b2c3d4e5f6");

    let single = service.by_id(&id).await.unwrap();
    assert_eq!(single.data.name, "Tamsui Old Street");
}

#[tokio::test]
async fn test_reimport_keeps_ids_stable() {
    let repo = LocalRepository::connected();
    let file = export_file(&pascal_export());

    import_file(&repo, file.path(), false).await.unwrap();
    import_file(&repo, file.path(), false).await.unwrap();

    let service = AttractionService::new(Arc::new(repo));
    let page = service.list(PageRequest::default()).await.unwrap();
    let ids: Vec<_> = page.data.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["C1_A", "C1_B"]);
}

#[tokio::test]
async fn test_empty_export_keeps_existing_collection() {
    let repo = support::store_with(support::mixed_catalog()).await;

    let file = export_file(&json!({"Attractions": []}));
    let outcome = import_file(&repo, file.path(), false).await.unwrap();
    assert_eq!(outcome, ImportOutcome::NoData);
    assert!(repo.find_by_id("longshan").await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_ids_are_rejected_without_dropping_data() {
    let repo = support::store_with(support::mixed_catalog()).await;

    let err = replace_attractions(
        &repo,
        vec![json!({"_id": "x", "name": "A"}), json!({"_id": "x", "name": "B"})],
        false,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::WriteError { .. }));
    assert!(repo.find_by_id("museum").await.unwrap().is_some());
    assert!(repo.find_by_id("x").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreadable_or_malformed_file() {
    let repo = LocalRepository::connected();
    let dir = tempfile::tempdir().unwrap();

    let err = import_file(&repo, dir.path().join("absent.json"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    let file = export_file(&json!({"UpdateTime": "2024-01-01"}));
    let err = import_file(&repo, file.path(), false).await.unwrap_err();
    assert!(matches!(err, RepositoryError::WriteError { .. }));
}

#[tokio::test]
async fn test_geo_index_gives_same_nearby_results() {
    let fallback = LocalRepository::connected();
    let native = LocalRepository::connected();
    replace_attractions(&fallback, support::mixed_catalog(), false)
        .await
        .unwrap();
    replace_attractions(&native, support::mixed_catalog(), true)
        .await
        .unwrap();
    assert_eq!(native.capabilities().await.unwrap().geo_field.as_deref(), Some("location"));
    assert_eq!(fallback.capabilities().await.unwrap().geo_field, None);

    let params = NearbyParams::new(121.52, 25.05, 10.0);
    let mut results = Vec::new();
    for repo in [fallback, native] {
        let page = AttractionService::new(Arc::new(repo))
            .nearby(params, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<String> = page.data.into_iter().map(|a| a.id).collect();
        results.push((page.total, ids));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].1, vec!["longshan", "tower", "museum"]);
}

#[tokio::test]
async fn test_factory_seeds_from_config() {
    let file = export_file(&pascal_export());
    let mut config = AppConfig::default();
    config.store.data_path = Some(file.path().to_path_buf());
    config.store.geo_index = true;

    let repo = RepositoryFactory::from_config(&config).await.unwrap();
    let service = AttractionService::new(repo);
    let page = service.list(PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 2);
}
