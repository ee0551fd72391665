//! PostgreSQL storage layer

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use opsboard_types::{Metric, Task};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

use crate::Config;

const MAX_CONNECTIONS: u32 = 20;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Row cap for task listings and the default for metric listings.
const LIST_LIMIT: i64 = 100;

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self> {
        tracing::info!(
            "Connecting to PostgreSQL database {} at {}:{}",
            config.db_name,
            config.db_host,
            config.db_port
        );

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .connect_with(Self::connect_options(config))
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL at {}:{}",
                    config.db_host, config.db_port
                )
            })?;

        tracing::info!("PostgreSQL connection established, bootstrapping schema...");

        let db = Self { pool };
        db.ensure_schema()
            .await
            .context("Failed to bootstrap database schema")?;

        tracing::info!("Database initialization complete");

        Ok(db)
    }

    fn connect_options(config: &Config) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&config.db_host)
            .port(config.db_port)
            .database(&config.db_name)
            .username(&config.db_user)
            .password(&config.db_password)
    }

    /// Pool that defers connecting until first use, for handler tests that
    /// stop short of the store.
    #[cfg(test)]
    pub fn connect_lazy(config: &Config) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(Self::connect_options(config));
        Self { pool }
    }

    /// Create the task and metric tables if absent. Idempotent, runs on
    /// every boot.
    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id SERIAL PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                status VARCHAR(50) NOT NULL DEFAULT 'pending',
                team_name VARCHAR(100) NOT NULL,
                service_name VARCHAR(100) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metrics (
                id SERIAL PRIMARY KEY,
                metric_name VARCHAR(100) NOT NULL,
                metric_value DOUBLE PRECISION NOT NULL,
                team_name VARCHAR(100) NOT NULL,
                service_name VARCHAR(100) NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Liveness probe used by the health endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // Task operations

    pub async fn list_tasks(&self, team: &str) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, status, team_name, service_name,
                   created_at, updated_at
            FROM tasks
            WHERE team_name = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(team)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn create_task(
        &self,
        team: &str,
        service: &str,
        title: &str,
        description: Option<&str>,
        status: &str,
    ) -> Result<Task, sqlx::Error> {
        let row: TaskRow = sqlx::query_as(
            r#"
            INSERT INTO tasks (title, description, status, team_name, service_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, team_name, service_name,
                      created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(team)
        .bind(service)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_task(&self, id: i32, team: &str) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, status, team_name, service_name,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND team_name = $2
            "#,
        )
        .bind(id)
        .bind(team)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }

    /// Partial update: NULL arguments keep the stored value, `updated_at`
    /// refreshes on every call.
    pub async fn update_task(
        &self,
        id: i32,
        team: &str,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<&str>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE tasks
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $4 AND team_name = $5
            RETURNING id, title, description, status, team_name, service_name,
                      created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(id)
        .bind(team)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }

    pub async fn delete_task(&self, id: i32, team: &str) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND team_name = $2
            RETURNING id, title, description, status, team_name, service_name,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(team)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }

    // Metric operations

    pub async fn insert_metric(
        &self,
        team: &str,
        service: &str,
        name: &str,
        value: f64,
    ) -> Result<Metric, sqlx::Error> {
        let row: MetricRow = sqlx::query_as(
            r#"
            INSERT INTO metrics (metric_name, metric_value, team_name, service_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, metric_name, metric_value, team_name, service_name, recorded_at
            "#,
        )
        .bind(name)
        .bind(value)
        .bind(team)
        .bind(service)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn list_metrics(
        &self,
        team: &str,
        metric_name: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Metric>, sqlx::Error> {
        let limit = limit.unwrap_or(LIST_LIMIT);

        let rows: Vec<MetricRow> = match metric_name {
            Some(name) => {
                sqlx::query_as(
                    r#"
                    SELECT id, metric_name, metric_value, team_name, service_name, recorded_at
                    FROM metrics
                    WHERE team_name = $1 AND metric_name = $2
                    ORDER BY recorded_at DESC, id DESC
                    LIMIT $3
                    "#,
                )
                .bind(team)
                .bind(name)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, metric_name, metric_value, team_name, service_name, recorded_at
                    FROM metrics
                    WHERE team_name = $1
                    ORDER BY recorded_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(team)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Metric::from).collect())
    }

    // Aggregate counts for /api/info

    pub async fn count_tasks(&self, team: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE team_name = $1")
            .bind(team)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_metrics(&self, team: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM metrics WHERE team_name = $1")
            .bind(team)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Helper structs for sqlx query_as

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: Option<String>,
    status: String,
    team_name: String,
    service_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            title: r.title,
            description: r.description,
            status: r.status,
            team_name: r.team_name,
            service_name: r.service_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    id: i32,
    metric_name: String,
    metric_value: f64,
    team_name: String,
    service_name: String,
    recorded_at: DateTime<Utc>,
}

impl From<MetricRow> for Metric {
    fn from(r: MetricRow) -> Self {
        Metric {
            id: r.id,
            metric_name: r.metric_name,
            metric_value: r.metric_value,
            team_name: r.team_name,
            service_name: r.service_name,
            recorded_at: r.recorded_at,
        }
    }
}
