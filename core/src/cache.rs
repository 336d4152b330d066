//! The point-read cache contract.
//!
//! The cache is strictly derived state. Every error it produces is treated
//! by callers as a miss: reads fall through to the record store and a failed
//! invalidation is logged without failing the write that triggered it.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// TTL for cached point reads.
pub const POINT_READ_TTL: Duration = Duration::from_secs(300);

/// The cache key for a review, `review:{id}` in decimal.
#[must_use]
pub fn review_key(id: u64) -> String {
    format!("review:{id}")
}

/// Errors from the cache adapter. Never fatal to the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend rejected or failed the command.
    #[error("cache error: {0}")]
    Backend(String),
}

/// Byte-oriented cache operations keyed by review id.
///
/// Payloads are JSON-encoded reviews; the repository owns encoding and
/// treats undecodable entries as misses to be overwritten.
#[async_trait]
pub trait ReviewCache: Send + Sync {
    /// Fetch a cached payload, `None` on miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a payload with a TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Drop a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
