//! Document store layer for the attraction collection.
//!
//! This module provides abstractions for store operations via the Repository
//! pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (axum)                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Query façade (services::attractions)                   │
//! │  - predicates, proximity search, normalization           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The module includes:
//! - `query`: predicates, sort and index specifications understood by every backend
//! - `repository`: trait definitions for store operations
//! - `repositories::local`: in-memory document store
//! - `import`: bulk replace from a JSON export
//! - `factory`: store construction, connection and seeding

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod import;
pub mod query;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use import::{import_file, replace_attractions, ImportOutcome};
pub use repositories::LocalRepository;
pub use repository::{
    DocumentRepository, ErrorContext, FullRepository, GeoRepository, MaintenanceRepository,
    RepositoryError, RepositoryResult,
};
