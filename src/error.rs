//! Error types for the tiered cache
//!
//! Only caller misuse surfaces as an error; remote-tier failures are absorbed
//! by the orchestrator (see [`crate::remote::RemoteError`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty or malformed namespace or key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid request data, such as a zero TTL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not present in either tier (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidKey(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (CacheError::InvalidKey("x".into()), StatusCode::BAD_REQUEST),
            (CacheError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (CacheError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CacheError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
