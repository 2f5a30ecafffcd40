//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::{AttractionService, QuerySettings};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query façade over the attraction store
    pub attractions: AttractionService,
}

impl AppState {
    /// Create a new application state over the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_settings(repository, QuerySettings::default())
    }

    pub fn with_settings(repository: Arc<dyn FullRepository>, settings: QuerySettings) -> Self {
        Self {
            attractions: AttractionService::with_settings(repository, settings),
        }
    }
}
