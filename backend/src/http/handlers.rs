//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! attraction query façade. Extractor rejections are mapped to validation
//! errors so every 4xx body has the same shape.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::dto::{FilterQuery, HealthResponse, NearbyQuery, PageQuery, SearchQuery, WelcomeResponse};
use super::error::AppError;
use super::state::AppState;
use crate::api::{Attraction, Page, Single};
use crate::services::PageRequest;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

const APP_NAME: &str = "Attractions Backend";

// =============================================================================
// Service status
// =============================================================================

/// GET /
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        status: "ok".to_string(),
        message: format!("Welcome to {} v{}", APP_NAME, env!("CARGO_PKG_VERSION")),
    })
}

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.attractions.health().await;
    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}

// =============================================================================
// Attractions
// =============================================================================

/// GET /api/attractions
pub async fn list_attractions(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> HandlerResult<Page<Attraction>> {
    let Query(query) = query?;
    let page = state.attractions.list(PageRequest::from(&query)).await?;
    Ok(Json(page))
}

/// GET /api/attractions/search?q=
pub async fn search_attractions(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> HandlerResult<Page<Attraction>> {
    let Query(query) = query?;
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    let result = state.attractions.search(query.q.as_deref(), page).await?;
    Ok(Json(result))
}

/// GET /api/attractions/filter?classes=1,2&free=true&region=
pub async fn filter_attractions(
    State(state): State<AppState>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> HandlerResult<Page<Attraction>> {
    let Query(query) = query?;
    let criteria = query.criteria()?;
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    let result = state.attractions.filter(&criteria, page).await?;
    Ok(Json(result))
}

/// GET /api/attractions/nearby?lon=&lat=&radius=
pub async fn nearby_attractions(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> HandlerResult<Page<Attraction>> {
    let Query(query) = query?;
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    let result = state.attractions.nearby((&query).into(), page).await?;
    Ok(Json(result))
}

/// GET /api/attractions/class/{class_id}
pub async fn attractions_by_class(
    State(state): State<AppState>,
    class_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> HandlerResult<Page<Attraction>> {
    let Path(class_id) = class_id?;
    let Query(query) = query?;
    let result = state
        .attractions
        .by_class(class_id, PageRequest::from(&query))
        .await?;
    Ok(Json(result))
}

/// GET /api/attractions/{attraction_id}
pub async fn get_attraction(
    State(state): State<AppState>,
    Path(attraction_id): Path<String>,
) -> HandlerResult<Single<Attraction>> {
    let result = state.attractions.by_id(&attraction_id).await?;
    Ok(Json(result))
}
