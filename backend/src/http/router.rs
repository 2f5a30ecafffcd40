//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Read-only public API: any origin may call it.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let attractions = Router::new()
        .route("/api/attractions", get(handlers::list_attractions))
        .route("/api/attractions/", get(handlers::list_attractions))
        .route("/api/attractions/search", get(handlers::search_attractions))
        .route("/api/attractions/filter", get(handlers::filter_attractions))
        .route("/api/attractions/nearby", get(handlers::nearby_attractions))
        .route("/api/attractions/class/{class_id}", get(handlers::attractions_by_class))
        .route("/api/attractions/{attraction_id}", get(handlers::get_attraction));

    Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health_check))
        .merge(attractions)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
