//! Redis cache adapter
//!
//! The cache is optional. When Redis is unreachable at startup the adapter
//! is constructed in unavailable mode and every operation answers
//! `CacheError::Unavailable` instead of blocking. Task writes treat that as
//! a soft failure; the cache endpoints surface it as 503.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use crate::Config;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Key holding a team's cached task listing, dropped on every task write.
pub fn task_list_key(team: &str) -> String {
    format!("tasks:{}", team)
}

/// Namespace a client-supplied cache key by team label.
pub fn namespaced_key(team: &str, key: &str) -> String {
    format!("{}:{}", team, key)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable")]
    Unavailable,
    #[error(transparent)]
    Backend(#[from] redis::RedisError),
}

pub struct RedisCache {
    manager: Option<ConnectionManager>,
}

impl RedisCache {
    /// Connect with a short timeout. Failure degrades to unavailable mode
    /// rather than aborting startup; a connection that drops later is
    /// re-established by the manager itself.
    pub async fn connect(config: &Config) -> Self {
        let url = format!("redis://{}:{}/", config.redis_host, config.redis_port);
        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(err) => {
                warn!("Invalid Redis configuration: {}", err);
                return Self::unavailable();
            }
        };

        match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
            Ok(Ok(manager)) => {
                tracing::info!(
                    "Redis cache connected at {}:{}",
                    config.redis_host,
                    config.redis_port
                );
                Self {
                    manager: Some(manager),
                }
            }
            Ok(Err(err)) => {
                warn!("Redis not available: {}", err);
                Self::unavailable()
            }
            Err(_) => {
                warn!("Redis connection timed out after {:?}", CONNECT_TIMEOUT);
                Self::unavailable()
            }
        }
    }

    /// Adapter with no backing connection; every operation reports
    /// `CacheError::Unavailable`.
    pub fn unavailable() -> Self {
        Self { manager: None }
    }

    pub fn is_available(&self) -> bool {
        self.manager.is_some()
    }

    fn manager(&self) -> Result<ConnectionManager, CacheError> {
        self.manager.clone().ok_or(CacheError::Unavailable)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager()?;
        Ok(conn.get(key).await?)
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.manager()?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager()?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.manager()?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_team() {
        assert_eq!(
            namespaced_key("team-blue", "leaderboard"),
            "team-blue:leaderboard"
        );
        assert_eq!(task_list_key("team-blue"), "tasks:team-blue");
    }

    #[tokio::test]
    async fn unavailable_cache_fails_soft_on_every_operation() {
        let cache = RedisCache::unavailable();
        assert!(!cache.is_available());
        assert!(matches!(cache.get("k").await, Err(CacheError::Unavailable)));
        assert!(matches!(
            cache.set_ex("k", "v", 60).await,
            Err(CacheError::Unavailable)
        ));
        assert!(matches!(
            cache.delete("k").await,
            Err(CacheError::Unavailable)
        ));
        assert!(matches!(cache.ping().await, Err(CacheError::Unavailable)));
    }
}
