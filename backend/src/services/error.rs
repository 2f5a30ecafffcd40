//! Error taxonomy of the query façade.

use serde::Serialize;

use crate::db::repository::RepositoryError;

/// One rejected request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result type for façade operations
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Request parameters failed validation; raised before any store call.
    #[error("validation failed: {}", describe(.0))]
    Validation(Vec<FieldError>),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The store could not be reached. Not retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(RepositoryError),

    /// The store was reachable but the operation failed.
    #[error("store error: {0}")]
    Store(RepositoryError),
}

impl QueryError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn attraction_not_found(id: impl Into<String>) -> Self {
        QueryError::NotFound {
            entity: "attraction",
            id: id.into(),
        }
    }
}

impl From<RepositoryError> for QueryError {
    fn from(err: RepositoryError) -> Self {
        if err.is_connection() {
            QueryError::StoreUnavailable(err)
        } else {
            QueryError::Store(err)
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects field errors so a request reports every bad parameter at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Record an error unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.reject(field, message);
        }
    }

    pub fn finish(self) -> QueryResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(QueryError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_collects_every_error() {
        let mut v = Validator::new();
        v.check(false, "page", "must be >= 1");
        v.check(true, "limit", "unused");
        v.reject("lat", "must be within [-90, 90]");
        match v.finish() {
            Err(QueryError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[1].field, "lat");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repository_errors_split_by_reachability() {
        let down: QueryError = RepositoryError::connection("store not connected").into();
        assert!(matches!(down, QueryError::StoreUnavailable(_)));
        let failed: QueryError = RepositoryError::query("text index required").into();
        assert!(matches!(failed, QueryError::Store(_)));
    }
}
