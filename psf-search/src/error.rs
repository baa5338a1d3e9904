//! Error types for the HTTP surface of psf-search

use crate::types::SearchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Search or bulk failure; status and code come from the error kind
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Invalid request body (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(error: &SearchError) -> StatusCode {
        match error {
            SearchError::InvalidQuery(_) | SearchError::BatchTooLarge { .. } => StatusCode::BAD_REQUEST,
            SearchError::NotFound(_) | SearchError::NoDataFound(_) => StatusCode::NOT_FOUND,
            SearchError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            SearchError::Auth { .. } | SearchError::MalformedResponse { .. } | SearchError::Network { .. } => {
                StatusCode::BAD_GATEWAY
            }
            SearchError::NoSourcesEnabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Search(ref err) => (Self::status(err), err.code(), err.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
