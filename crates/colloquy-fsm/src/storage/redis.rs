//! Redis storage backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{DefaultKeyBuilder, KeyBuilder, KeyPart, StateData, Storage};
use crate::error::StorageResult;
use crate::isolation::RedisEventIsolation;
use crate::key::StorageKey;

/// Storage backed by Redis.
///
/// State and data live at two separate keys derived by the key builder,
/// so each can carry its own TTL and clearing one never touches the
/// other. Clearing writes no tombstone — the key is deleted, which
/// keeps "cleared" and "never existed" indistinguishable and lets Redis
/// reclaim the memory.
///
/// The connection is a [`ConnectionManager`]: one multiplexed
/// connection with automatic reconnection, cloned per operation.
#[derive(Clone)]
pub struct RedisStorage {
    conn: ConnectionManager,
    key_builder: Arc<dyn KeyBuilder>,
    state_ttl: Option<Duration>,
    data_ttl: Option<Duration>,
}

impl RedisStorage {
    /// Connects using a `redis://` connection string.
    pub async fn from_url(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::new(conn))
    }

    /// Wraps an existing connection.
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            key_builder: Arc::new(DefaultKeyBuilder::new()),
            state_ttl: None,
            data_ttl: None,
        }
    }

    /// Replaces the key builder.
    pub fn with_key_builder(mut self, key_builder: impl KeyBuilder + 'static) -> Self {
        self.key_builder = Arc::new(key_builder);
        self
    }

    /// Expires state entries after `ttl`.
    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Expires data entries after `ttl`.
    pub fn with_data_ttl(mut self, ttl: Duration) -> Self {
        self.data_ttl = Some(ttl);
        self
    }

    /// Creates an event isolation sharing this storage's connection and
    /// key namespace.
    pub fn create_isolation(&self) -> RedisEventIsolation {
        RedisEventIsolation::new(self.conn.clone(), Arc::clone(&self.key_builder))
    }

    async fn write(
        &self,
        redis_key: &str,
        value: Option<String>,
        ttl: Option<Duration>,
    ) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        match value {
            Some(value) => match ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(redis_key, value, ttl.as_secs()).await?,
                None => conn.set::<_, _, ()>(redis_key, value).await?,
            },
            None => conn.del::<_, ()>(redis_key).await?,
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get_state(&self, key: &StorageKey) -> StorageResult<Option<String>> {
        let redis_key = self.key_builder.build(key, Some(KeyPart::State))?;
        let mut conn = self.conn.clone();
        Ok(conn.get(redis_key).await?)
    }

    async fn set_state(&self, key: &StorageKey, state: Option<&str>) -> StorageResult<()> {
        let redis_key = self.key_builder.build(key, Some(KeyPart::State))?;
        self.write(&redis_key, state.map(str::to_owned), self.state_ttl)
            .await
    }

    async fn get_data(&self, key: &StorageKey) -> StorageResult<StateData> {
        let redis_key = self.key_builder.build(key, Some(KeyPart::Data))?;
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(redis_key).await?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(StateData::new()),
        }
    }

    async fn set_data(&self, key: &StorageKey, data: StateData) -> StorageResult<()> {
        let redis_key = self.key_builder.build(key, Some(KeyPart::Data))?;
        let value = if data.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&data)?)
        };
        self.write(&redis_key, value, self.data_ttl).await
    }

    async fn close(&self) -> StorageResult<()> {
        // The multiplexed connection closes when the last clone drops.
        Ok(())
    }
}
