//! Cache passthrough handlers
//!
//! Keys are namespaced by the configured team label. Unlike task CRUD,
//! these endpoints require the cache to be reachable and answer 503
//! otherwise.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::storage::namespaced_key;
use crate::AppState;

const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
pub struct CacheWriteRequest {
    key: Option<String>,
    value: Option<Value>,
    ttl: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CacheWriteResponse {
    message: &'static str,
    key: String,
    ttl: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheReadResponse {
    key: String,
    value: Value,
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CacheReadResponse>, ApiError> {
    let raw = state
        .cache
        .get(&namespaced_key(&state.config.team_name, &key))
        .await?
        .ok_or(ApiError::NotFound("Key not found"))?;

    let value: Value = serde_json::from_str(&raw)?;
    Ok(Json(CacheReadResponse { key, value }))
}

pub async fn store(
    State(state): State<AppState>,
    Json(req): Json<CacheWriteRequest>,
) -> Result<Json<CacheWriteResponse>, ApiError> {
    let (key, value) = match (req.key, req.value) {
        (Some(key), Some(value)) if !key.is_empty() => (key, value),
        _ => return Err(ApiError::validation("key and value are required")),
    };
    let ttl = req.ttl.unwrap_or(DEFAULT_TTL_SECS);

    let payload = serde_json::to_string(&value)?;
    state
        .cache
        .set_ex(
            &namespaced_key(&state.config.team_name, &key),
            &payload,
            ttl,
        )
        .await?;

    Ok(Json(CacheWriteResponse {
        message: "Cached successfully",
        key,
        ttl,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::send;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn store_requires_key_and_value() {
        // Presence checks win over cache availability
        let (status, body) = send(Method::POST, "/api/cache", Some(json!({ "key": "k" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "key and value are required");

        let (status, body) =
            send(Method::POST, "/api/cache", Some(json!({ "value": [1, 2] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "key and value are required");
    }

    #[tokio::test]
    async fn store_reports_503_when_cache_unavailable() {
        let (status, body) = send(
            Method::POST,
            "/api/cache",
            Some(json!({ "key": "leaderboard", "value": { "first": "team-blue" } })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Cache not available");
    }

    #[tokio::test]
    async fn fetch_reports_503_when_cache_unavailable() {
        let (status, body) = send(Method::GET, "/api/cache/leaderboard", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Cache not available");
    }

    #[test]
    fn write_payload_defaults_ttl_to_an_hour() {
        let req: CacheWriteRequest =
            serde_json::from_value(json!({ "key": "k", "value": 1 })).unwrap();
        assert_eq!(req.ttl.unwrap_or(DEFAULT_TTL_SECS), 3600);

        let req: CacheWriteRequest =
            serde_json::from_value(json!({ "key": "k", "value": 1, "ttl": 60 })).unwrap();
        assert_eq!(req.ttl, Some(60));
    }
}
