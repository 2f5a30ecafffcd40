//! Read operations over the attractions collection.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::query::{FindOptions, Predicate, RawDocument, ScoredDocument, StoreCapabilities};

/// Repository trait for document reads.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Report what the store supports (text scoring, geospatial index).
    async fn capabilities(&self) -> RepositoryResult<StoreCapabilities>;

    /// Find documents matching `predicate`, applying sort, then skip, then limit.
    async fn find_many(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> RepositoryResult<Vec<RawDocument>>;

    /// Count documents matching `predicate`. Must agree with `find_many`.
    async fn count(&self, predicate: &Predicate) -> RepositoryResult<u64>;

    /// Fetch one document by the store's internal identifier.
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<RawDocument>>;

    /// Full-text search over the text index.
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredDocument>)` - Hits with their relevance score
    /// * `Err(RepositoryError)` - If no text index exists or the query fails
    async fn text_search(
        &self,
        query: &str,
        options: &FindOptions,
    ) -> RepositoryResult<Vec<ScoredDocument>>;

    /// Count text search hits. Must agree with `text_search`.
    async fn count_text(&self, query: &str) -> RepositoryResult<u64>;
}
