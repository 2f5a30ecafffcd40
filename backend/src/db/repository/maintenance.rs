//! Connection lifecycle and write-side operations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::query::{IndexSpec, RawDocument};

/// Repository trait for lifecycle and bulk maintenance.
///
/// Connection state is explicit: a store that was never connected, or that
/// has been closed, rejects every operation with a connection error.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Open the store connection.
    async fn connect(&self) -> RepositoryResult<()>;

    /// Release the store connection.
    async fn close(&self) -> RepositoryResult<()>;

    /// Check if the store is connected and answering.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Drop the collection (and its indexes), then insert `documents`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of documents inserted
    /// * `Err(RepositoryError)` - If the store rejected the write
    async fn replace_all(&self, documents: Vec<RawDocument>) -> RepositoryResult<usize>;

    /// Create an index. Creating an existing index is a no-op.
    ///
    /// # Returns
    /// * `Ok(String)` - The index name
    async fn create_index(&self, index: IndexSpec) -> RepositoryResult<String>;
}
