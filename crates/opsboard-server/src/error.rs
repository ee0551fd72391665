//! API error taxonomy
//!
//! Every handler returns `Result<_, ApiError>`; the mapping from error kind
//! to HTTP status lives here so behavior is uniform across routes. Store
//! detail is logged server-side and never reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::storage::CacheError;

const GENERIC_ERROR: &str = "Something went wrong!";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or empty required field
    #[error("{0}")]
    Validation(String),

    /// Row absent, or owned by another team
    #[error("{0}")]
    NotFound(&'static str),

    /// Store connectivity/query failure or serialization failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),

    /// Cache not connected; only cache-specific endpoints surface this
    #[error("Cache not available")]
    CacheUnavailable,
}

impl ApiError {
    pub fn validation(message: &str) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CacheUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.into())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable => Self::CacheUnavailable,
            CacheError::Backend(source) => Self::Store(source.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Store(source) => {
                error!("Request failed: {:#}", source);
                GENERIC_ERROR.to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Response for panics caught by `CatchPanicLayer`: the fixed 500 body,
/// with the panic payload logged.
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": GENERIC_ERROR })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::to_bytes;
    use serde_json::Value;

    #[test]
    fn each_kind_maps_to_one_status() {
        assert_eq!(
            ApiError::validation("Title is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Task not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Store(anyhow!("connection refused")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::CacheUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn cache_errors_split_into_unavailable_and_store() {
        let err = ApiError::from(CacheError::Unavailable);
        assert!(matches!(err, ApiError::CacheUnavailable));
    }

    #[tokio::test]
    async fn store_errors_render_the_generic_body() {
        let response = ApiError::Store(anyhow!("db exploded")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Something went wrong!");
    }

    #[tokio::test]
    async fn validation_errors_keep_their_message() {
        let response = ApiError::validation("Title is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Title is required");
    }
}
