use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::expiring::CacheError;

/// The library's error type.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A cache backend error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// A session (de)serialization error.
    #[error("Session serialization failed: {0}")]
    Serialization(String),
}

/// A `Result` type that uses `SessionError` as the error type.
pub type Result<T> = std::result::Result<T, SessionError>;

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SessionError::Cache(ref e) => {
                tracing::error!("Cache error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error".to_string())
            }

            SessionError::Serialization(ref msg) => {
                tracing::error!("Session serialization failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
