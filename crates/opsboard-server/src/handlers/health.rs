//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use opsboard_types::{CheckState, HealthStatus};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: HealthStatus,
    timestamp: DateTime<Utc>,
    team: String,
    service: String,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    database: CheckState,
    cache: CheckState,
}

/// Probe the store and cache and report aggregate liveness.
///
/// The store is required: unreachable means degraded and a 503, with the
/// JSON body still present. The cache is advisory and only shows up in the
/// per-dependency checks.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.db.ping().await {
        Ok(()) => CheckState::Connected,
        Err(err) => {
            warn!("Database health probe failed: {}", err);
            CheckState::Disconnected
        }
    };

    let cache = if !state.cache.is_available() {
        CheckState::NotConfigured
    } else {
        match state.cache.ping().await {
            Ok(()) => CheckState::Connected,
            Err(err) => {
                warn!("Cache health probe failed: {}", err);
                CheckState::Disconnected
            }
        }
    };

    let status = if database == CheckState::Connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = HealthResponse {
        status,
        timestamp: Utc::now(),
        team: state.config.team_name.clone(),
        service: state.config.service_name.clone(),
        checks: HealthChecks { database, cache },
    };

    (code, Json(body))
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::send;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn degraded_when_store_unreachable() {
        let (status, body) = send(Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["database"], "disconnected");
        assert_eq!(body["checks"]["cache"], "not configured");
        assert_eq!(body["team"], "team-blue");
        assert_eq!(body["service"], "api");
    }
}
