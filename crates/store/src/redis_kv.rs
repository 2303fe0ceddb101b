//! Redis-backed `KeyValueStore` adapter: memory windows, billing
//! counters, the BM25 lexical-index cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use support_agent_core::ports::KeyValueStore;
use support_agent_core::{Error, Result};

pub struct RedisKeyValueStore {
    connection: ConnectionManager,
}

impl RedisKeyValueStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.connection.clone();
        conn.incr(key, delta).await.map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.expire::<_, ()>(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(|err| Error::KeyValueStoreUnavailable(err.to_string()))
    }
}
