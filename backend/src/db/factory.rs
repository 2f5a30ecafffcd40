//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository
//! instances based on runtime configuration. The factory owns startup: it
//! connects the store, declares indexes and loads the seed export.

use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};

use super::import::{ensure_indexes, import_file, ImportOutcome};
use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::config::AppConfig;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string (`"local"` or `"memory"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use attractions_backend::config::AppConfig;
/// use attractions_backend::db::RepositoryFactory;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// runtime.block_on(async {
///     let repo = RepositoryFactory::from_config(&AppConfig::default()).await.unwrap();
///     assert!(repo.health_check().await.unwrap());
/// });
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory local repository. The handle starts disconnected.
    pub fn create_local() -> Arc<LocalRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create and connect a repository of the given type.
    pub async fn create(repo_type: RepositoryType) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo: Arc<dyn FullRepository> = match repo_type {
            RepositoryType::Local => Self::create_local(),
        };
        repo.connect().await?;
        Ok(repo)
    }

    /// Create, connect and seed the repository described by `config`.
    pub async fn from_config(config: &AppConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config
            .repository_type()
            .map_err(|e| RepositoryError::configuration(e.to_string()))?;
        let repo = Self::create(repo_type).await?;

        let outcome = match &config.store.data_path {
            Some(path) => import_file(repo.as_ref(), path, config.store.geo_index).await?,
            None => {
                info!("No seed data configured; starting with an empty collection");
                ImportOutcome::NoData
            }
        };
        match outcome {
            ImportOutcome::Imported { count, imported_at } => {
                info!("Seeded {} attractions at {}", count, imported_at.to_rfc3339());
            }
            ImportOutcome::NoData => {
                if config.store.data_path.is_some() {
                    warn!("Seed file held no attractions");
                }
                ensure_indexes(repo.as_ref(), config.store.geo_index).await?;
            }
        }
        Ok(repo)
    }
}
