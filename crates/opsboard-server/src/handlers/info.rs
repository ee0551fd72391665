//! Welcome and system info handlers

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    message: String,
    team: String,
    service: String,
    environment: String,
    timestamp: DateTime<Utc>,
    endpoints: Value,
}

/// Static welcome payload with the service's identity labels.
pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeResponse> {
    let cfg = &state.config;
    Json(WelcomeResponse {
        message: format!("Welcome to {} - {}", cfg.team_name, cfg.service_name),
        team: cfg.team_name.clone(),
        service: cfg.service_name.clone(),
        environment: cfg.environment.clone(),
        timestamp: Utc::now(),
        endpoints: json!({
            "health": "/health",
            "tasks": "/api/tasks",
            "metrics": "/api/metrics",
            "cache": "/api/cache",
            "info": "/api/info",
        }),
    })
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    team: String,
    service: String,
    version: &'static str,
    uptime: f64,
    memory: MemoryUsage,
    environment: String,
    stats: RecordCounts,
    database: DatabaseInfo,
    cache: CacheInfo,
}

#[derive(Debug, Serialize)]
struct MemoryUsage {
    rss: u64,
    #[serde(rename = "virtual")]
    virtual_bytes: u64,
}

#[derive(Debug, Serialize)]
struct RecordCounts {
    tasks: i64,
    metrics: i64,
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    host: String,
    database: String,
}

#[derive(Debug, Serialize)]
struct CacheInfo {
    available: bool,
}

/// Aggregate record counts, process uptime/memory, and a config echo.
pub async fn info(State(state): State<AppState>) -> Result<Json<InfoResponse>, ApiError> {
    let cfg = &state.config;
    let tasks = state.db.count_tasks(&cfg.team_name).await?;
    let metrics = state.db.count_metrics(&cfg.team_name).await?;

    Ok(Json(InfoResponse {
        team: cfg.team_name.clone(),
        service: cfg.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs_f64(),
        memory: process_memory(),
        environment: cfg.environment.clone(),
        stats: RecordCounts { tasks, metrics },
        database: DatabaseInfo {
            host: cfg.db_host.clone(),
            database: cfg.db_name.clone(),
        },
        cache: CacheInfo {
            available: state.cache.is_available(),
        },
    }))
}

fn process_memory() -> MemoryUsage {
    use sysinfo::{ProcessExt, System, SystemExt};

    let mut sys = System::new();
    if let Ok(pid) = sysinfo::get_current_pid() {
        if sys.refresh_process(pid) {
            if let Some(process) = sys.process(pid) {
                return MemoryUsage {
                    rss: process.memory(),
                    virtual_bytes: process.virtual_memory(),
                };
            }
        }
    }

    MemoryUsage {
        rss: 0,
        virtual_bytes: 0,
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::send;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn welcome_reports_identity_and_endpoint_index() {
        let (status, body) = send(Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to team-blue - api");
        assert_eq!(body["team"], "team-blue");
        assert_eq!(body["service"], "api");
        assert_eq!(body["environment"], "test");
        assert_eq!(body["endpoints"]["tasks"], "/api/tasks");
        assert_eq!(body["endpoints"]["health"], "/health");
    }

    #[tokio::test]
    async fn unknown_routes_fall_through_to_404() {
        let (status, _) = send(Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
