//! Storage layer
//!
//! PostgreSQL for durable task and metric rows, Redis for the optional
//! key-value cache.

pub mod db;
pub mod redis;

pub use self::db::Database;
pub use self::redis::{namespaced_key, task_list_key, CacheError, RedisCache};
