//! Native geospatial queries.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::query::{NearQuery, RawDocument};

/// Repository trait for stores with a geospatial index.
///
/// Callers must check [`StoreCapabilities::geo_field`] first; without a
/// declared index these methods fail with a query error.
///
/// [`StoreCapabilities::geo_field`]: crate::db::query::StoreCapabilities
#[async_trait]
pub trait GeoRepository: Send + Sync {
    /// Documents within `max_distance_m` of the center, nearest first.
    async fn find_near(&self, query: &NearQuery) -> RepositoryResult<Vec<RawDocument>>;

    /// Count of documents within `max_distance_m`; ignores skip and limit.
    async fn count_near(&self, query: &NearQuery) -> RepositoryResult<u64>;
}
