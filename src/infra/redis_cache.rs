use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use super::InfraError;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::cache::CacheStore,
};

/// Redis-backed string store for identity mappings and snapshots.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;

        Ok(Self { manager })
    }
}

fn cache_error(e: redis::RedisError) -> AppError {
    AppError::Cache(e.to_string())
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut conn = self.manager.clone();

        match ttl {
            Some(ttl) => {
                // SETEX rejects zero
                let ttl_secs = ttl.as_secs().max(1);
                let _: () = conn
                    .set_ex(key, value, ttl_secs)
                    .await
                    .map_err(cache_error)?;
            }
            None => {
                let _: () = conn.set(key, value).await.map_err(cache_error)?;
            }
        }

        Ok(())
    }
}
