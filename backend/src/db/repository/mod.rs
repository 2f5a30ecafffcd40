//! Repository trait definitions for the document store adapter.
//!
//! The adapter is a thin capability surface over the backing store with no
//! business logic. Responsibilities are split across focused traits:
//!
//! - [`error`]: Error types for repository operations
//! - [`documents`]: Predicate find, count, lookup by id and text search
//! - [`geo`]: Nearest-first queries against a declared geospatial index
//! - [`maintenance`]: Connection lifecycle, bulk replace and index creation
//!
//! # Convenience Trait Bound
//!
//! Services hold an `Arc<dyn FullRepository>`:
//!
//! ```ignore
//! async fn total<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<u64> {
//!     repo.count(&Predicate::All).await
//! }
//! ```

pub mod documents;
pub mod error;
pub mod geo;
pub mod maintenance;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use documents::DocumentRepository;
pub use geo::GeoRepository;
pub use maintenance::MaintenanceRepository;

/// Composite trait bound for a complete store implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
pub trait FullRepository: DocumentRepository + GeoRepository + MaintenanceRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: DocumentRepository + GeoRepository + MaintenanceRepository {}
