//! Task records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status a task starts in when the client does not supply one.
pub const DEFAULT_TASK_STATUS: &str = "pending";

/// A task row as stored and returned by the API.
///
/// The `team_name` and `service_name` labels are always the server's
/// configured identity; clients cannot set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub team_name: String,
    pub service_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
