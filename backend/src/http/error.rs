//! HTTP error handling and response types.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::{FieldError, QueryError};

/// API error response body: `{error, detail}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Short error title
    pub error: String,
    /// Message, or a list of `{field, message}` for validation errors
    pub detail: Value,
}

impl ApiError {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: Value::String(detail.into()),
        }
    }

    pub fn validation(errors: &[FieldError]) -> Self {
        Self {
            error: "Validation Error".to_string(),
            detail: serde_json::to_value(errors).unwrap_or(Value::Null),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Failure reported by the query façade
    Query(QueryError),
    /// Query string or path segment that does not deserialize
    BadRequest(FieldError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Query(QueryError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Query(QueryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Query(QueryError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Query(QueryError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::BadRequest(field) => ApiError::validation(&[field]),
            AppError::Query(QueryError::Validation(errors)) => ApiError::validation(&errors),
            AppError::Query(err @ QueryError::NotFound { .. }) => {
                ApiError::new("Not Found", err.to_string())
            }
            AppError::Query(QueryError::StoreUnavailable(e)) => {
                tracing::error!("store unavailable: {}", e);
                ApiError::new("Store Unavailable", "the attraction store is not reachable")
            }
            AppError::Query(err) => {
                tracing::error!("request failed: {}", err);
                ApiError::new("Internal Error", err.to_string())
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::Query(err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(FieldError {
            field: "query".to_string(),
            message: rejection.body_text(),
        })
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(FieldError {
            field: "path".to_string(),
            message: rejection.body_text(),
        })
    }
}
