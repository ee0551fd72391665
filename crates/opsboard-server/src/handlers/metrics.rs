//! Metric handlers
//!
//! Metrics are append-only: record and list, no update or delete.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsboard_types::Metric;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordMetricRequest {
    metric_name: Option<String>,
    metric_value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricListQuery {
    metric_name: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MetricResponse {
    metric: Metric,
}

#[derive(Debug, Serialize)]
pub struct MetricListResponse {
    metrics: Vec<Metric>,
    count: usize,
}

pub async fn record(
    State(state): State<AppState>,
    Json(req): Json<RecordMetricRequest>,
) -> Result<(StatusCode, Json<MetricResponse>), ApiError> {
    // A zero value is present; only an absent field fails the check.
    let (name, value) = match (req.metric_name.as_deref(), req.metric_value) {
        (Some(name), Some(value)) if !name.is_empty() => (name, value),
        _ => {
            return Err(ApiError::validation(
                "metric_name and metric_value are required",
            ))
        }
    };

    let metric = state
        .db
        .insert_metric(
            &state.config.team_name,
            &state.config.service_name,
            name,
            value,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(MetricResponse { metric })))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<MetricListQuery>,
) -> Result<Json<MetricListResponse>, ApiError> {
    let metrics = state
        .db
        .list_metrics(
            &state.config.team_name,
            query.metric_name.as_deref(),
            query.limit,
        )
        .await?;
    let count = metrics.len();

    Ok(Json(MetricListResponse { metrics, count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::send;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn record_requires_name_and_value() {
        let (status, body) = send(
            Method::POST,
            "/api/metrics",
            Some(json!({ "metric_name": "cpu_usage" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "metric_name and metric_value are required");

        let (status, body) = send(
            Method::POST,
            "/api/metrics",
            Some(json!({ "metric_value": 0.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "metric_name and metric_value are required");
    }

    #[test]
    fn zero_value_counts_as_present() {
        let req: RecordMetricRequest =
            serde_json::from_value(json!({ "metric_name": "errors", "metric_value": 0 })).unwrap();
        assert_eq!(req.metric_value, Some(0.0));

        let req: RecordMetricRequest =
            serde_json::from_value(json!({ "metric_name": "errors" })).unwrap();
        assert!(req.metric_value.is_none());
    }

    #[test]
    fn list_query_defaults_to_no_filter() {
        let query: MetricListQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.metric_name.is_none());
        assert!(query.limit.is_none());
    }
}
