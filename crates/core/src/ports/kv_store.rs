use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Single shared connection pool capability. No multi-key transactions
/// are required; counter increments rely on the store's own single-key
/// atomicity.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically increments the key by `delta` (creating it at `delta`
    /// if absent) and returns the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    async fn get_i64(&self, key: &str) -> Result<i64> {
        Ok(match self.get(key).await? {
            Some(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0),
            None => 0,
        })
    }
}
