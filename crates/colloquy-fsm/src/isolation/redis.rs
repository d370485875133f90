//! Distributed isolation on Redis.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;
use tracing::warn;
use uuid::Uuid;

use super::{EventIsolation, IsolationGuard};
use crate::error::StorageResult;
use crate::key::StorageKey;
use crate::storage::{DefaultKeyBuilder, KeyBuilder, KeyPart};

const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Deletes the lock only while it still holds the caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Cross-process isolation using `SET NX PX` leases.
///
/// Each acquisition writes a random token under the key builder's
/// `lock` part and polls until the write lands. Release is a Lua
/// compare-and-delete, so a lease that outlived its TTL can never
/// delete a successor's lock. If the holder crashes, the TTL frees the
/// context.
pub struct RedisEventIsolation {
    conn: ConnectionManager,
    key_builder: Arc<dyn KeyBuilder>,
    lock_ttl: Duration,
    poll_interval: Duration,
}

impl RedisEventIsolation {
    /// Connects using a `redis://` connection string.
    pub async fn from_url(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::new(conn, Arc::new(DefaultKeyBuilder::new())))
    }

    /// Wraps an existing connection.
    pub fn new(conn: ConnectionManager, key_builder: Arc<dyn KeyBuilder>) -> Self {
        Self {
            conn,
            key_builder,
            lock_ttl: DEFAULT_LOCK_TTL,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Caps how long a crashed holder keeps a context blocked.
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Sets the retry interval while a context is held elsewhere.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl EventIsolation for RedisEventIsolation {
    async fn lock(&self, key: &StorageKey) -> StorageResult<IsolationGuard> {
        let lock_key = self.key_builder.build(key, Some(KeyPart::Lock))?;
        let token = Uuid::new_v4().to_string();
        let ttl_ms = u64::try_from(self.lock_ttl.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);

        let mut conn = self.conn.clone();
        loop {
            let claimed: Option<String> = redis::cmd("SET")
                .arg(&lock_key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await?;
            if claimed.is_some() {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Ok(IsolationGuard::holding(RedisLockLease {
            conn: self.conn.clone(),
            lock_key,
            token,
        }))
    }
}

struct RedisLockLease {
    conn: ConnectionManager,
    lock_key: String,
    token: String,
}

impl Drop for RedisLockLease {
    fn drop(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            // No runtime to release on; the TTL reclaims the lock.
            return;
        };
        let mut conn = self.conn.clone();
        let lock_key = mem::take(&mut self.lock_key);
        let token = mem::take(&mut self.token);
        handle.spawn(async move {
            let released: Result<i64, _> = Script::new(RELEASE_SCRIPT)
                .key(&lock_key)
                .arg(&token)
                .invoke_async(&mut conn)
                .await;
            if let Err(error) = released {
                warn!(%lock_key, %error, "Failed to release context lock");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;

    const TEST_URL: &str = "redis://127.0.0.1:6379/15";

    async fn isolation() -> RedisEventIsolation {
        RedisEventIsolation::from_url(TEST_URL)
            .await
            .unwrap()
            .with_lock_ttl(Duration::from_secs(2))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_lock_excludes_other_holders() {
        let first = isolation().await;
        let second = isolation().await;
        let key = StorageKey::new(7, -42, 3001);

        let held = first.lock(&key).await.unwrap();
        let blocked = timeout(Duration::from_millis(200), second.lock(&key)).await;
        assert!(blocked.is_err());

        drop(held);
        let acquired = timeout(Duration::from_secs(1), second.lock(&key)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_expired_lease_is_reclaimed() {
        let first = isolation().await.with_lock_ttl(Duration::from_millis(100));
        let second = isolation().await;
        let key = StorageKey::new(7, -42, 3002);

        // Leak the lease: the TTL must free the context on its own.
        mem::forget(first.lock(&key).await.unwrap());
        let acquired = timeout(Duration::from_secs(1), second.lock(&key)).await;
        assert!(acquired.is_ok());
    }
}
