//! Redis-backed point-read cache for the review service.
//!
//! Values are TTL'd JSON payloads keyed `review:{id}`. The cache is never
//! load-bearing: every error maps to a miss on reads and is logged and
//! ignored on writes, so a Redis outage degrades latency, not correctness.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use review_core::{CacheError, ReviewCache};
use std::time::Duration;

/// Redis implementation of the review cache.
///
/// Uses a [`ConnectionManager`] so a single client can be cloned across
/// request handlers and reconnects on its own after broker hiccups.
#[derive(Clone)]
pub struct RedisReviewCache {
    conn: ConnectionManager,
}

impl RedisReviewCache {
    /// Connect to Redis and ping it once.
    ///
    /// The ping failure is reported to the caller, who may choose to run
    /// without a cache rather than abort startup.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] if the URL is invalid or the initial
    /// connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Backend(format!("invalid redis url: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Backend(format!("failed to connect: {e}")))?;

        tracing::info!(url = %redis_url, "review cache connected");
        Ok(Self { conn })
    }

    /// Round-trip a `PING` to verify the connection.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] if the server does not answer.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("ping failed: {e}")))
    }
}

#[async_trait]
impl ReviewCache for RedisReviewCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Backend(format!("GET {key}: {e}")))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| CacheError::Backend(format!("SETEX {key}: {e}")))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CacheError::Backend(format!("DEL {key}: {e}")))
    }
}
