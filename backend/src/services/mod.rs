//! Service layer for query logic and orchestration.
//!
//! This module contains the service layer that sits between the document
//! store and the HTTP handlers. Services validate parameters, build store
//! queries, run proximity search and normalize what the store returns.

pub mod attractions;

pub mod error;

pub mod geo;

pub mod normalize;

pub mod pagination;

pub mod predicate;

pub mod proximity;

pub use attractions::{AttractionService, QuerySettings};
pub use error::{FieldError, QueryError, QueryResult};
pub use normalize::{normalize, NormalizationError};
pub use pagination::{PageRequest, Pagination};
pub use predicate::FilterCriteria;
pub use proximity::NearbyParams;
