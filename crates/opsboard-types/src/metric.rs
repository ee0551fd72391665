//! Metric records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded metric sample. Append-only: no update or delete exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i32,
    pub metric_name: String,
    pub metric_value: f64,
    pub team_name: String,
    pub service_name: String,
    pub recorded_at: DateTime<Utc>,
}
