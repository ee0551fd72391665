//! Opsboard Server
//!
//! Minimal CRUD service exposing task and metric records for a single team,
//! backed by PostgreSQL with an optional Redis cache layer. The cache
//! degrades functionality, never availability: task CRUD keeps working when
//! Redis is down.

mod error;
mod handlers;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use storage::{Database, RedisCache};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: Arc<RedisCache>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Opsboard Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = Arc::new(load_config());
    info!(
        "Config loaded: port={}, team={}, service={}",
        config.port, config.team_name, config.service_name
    );

    // Connect to PostgreSQL and run the idempotent schema bootstrap
    let db = Arc::new(
        Database::connect(&config)
            .await
            .context("Failed to initialize database")?,
    );

    // Redis is optional: a failed connect leaves the cache unavailable
    let cache = Arc::new(RedisCache::connect(&config).await);

    let state = AppState {
        db: db.clone(),
        cache,
        config: config.clone(),
        started_at: Instant::now(),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server running on port {}", config.port);
    info!("Team: {}", config.team_name);
    info!("Service: {}", config.service_name);
    info!("Environment: {}", config.environment);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Listener closed; release store resources before exiting
    db.close().await;
    info!("Database pool closed, shutting down");

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::welcome))
        .nest("/api", api_routes())
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list).post(handlers::tasks::create),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get)
                .put(handlers::tasks::update)
                .delete(handlers::tasks::delete),
        )
        .route(
            "/metrics",
            get(handlers::metrics::list).post(handlers::metrics::record),
        )
        .route("/cache", post(handlers::cache::store))
        .route("/cache/:key", get(handlers::cache::fetch))
        .route("/info", get(handlers::info))
}

/// Resolves on SIGTERM or Ctrl+C so the listener stops accepting new
/// connections and in-flight requests get a graceful close attempt.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Termination signal received: closing HTTP server");
}

/// Immutable service configuration, read from the environment once at
/// startup and passed to handlers through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub team_name: String,
    pub service_name: String,
    pub environment: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub redis_host: String,
    pub redis_port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_port(key: &str, default: u16) -> u16 {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {} value {:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn load_config() -> Config {
    Config {
        port: env_port("PORT", 3000),
        team_name: env_or("TEAM_NAME", "unknown"),
        service_name: env_or("SERVICE_NAME", "api"),
        environment: env_or("ENVIRONMENT", "local"),
        db_host: env_or("DB_HOST", "localhost"),
        db_port: env_port("DB_PORT", 5432),
        db_name: env_or("DB_NAME", "hackathon"),
        db_user: env_or("DB_USER", "postgres"),
        db_password: env_or("DB_PASSWORD", "postgres"),
        redis_host: env_or("REDIS_HOST", "localhost"),
        redis_port: env_port("REDIS_PORT", 6379),
    }
}

/// State whose pool never connects and whose cache is unavailable, for
/// handler tests that stop short of the store.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = Arc::new(Config {
        port: 0,
        team_name: "team-blue".to_string(),
        service_name: "api".to_string(),
        environment: "test".to_string(),
        db_host: "127.0.0.1".to_string(),
        db_port: 1,
        db_name: "hackathon".to_string(),
        db_user: "postgres".to_string(),
        db_password: "postgres".to_string(),
        redis_host: "127.0.0.1".to_string(),
        redis_port: 1,
    });

    AppState {
        db: Arc::new(Database::connect_lazy(&config)),
        cache: Arc::new(RedisCache::unavailable()),
        config,
        started_at: Instant::now(),
    }
}
