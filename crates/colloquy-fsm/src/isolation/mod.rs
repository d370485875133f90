//! Per-context event serialization.
//!
//! Two events for the same context racing through their handlers can
//! interleave storage reads and writes. An [`EventIsolation`] hands out
//! a lock per [`StorageKey`] so processing for one context is
//! sequential while unrelated contexts proceed in parallel.
//!
//! - [`DisabledIsolation`] never blocks.
//! - [`InMemoryIsolation`] serializes within one process.
//! - `RedisEventIsolation` (behind the `redis-storage` feature)
//!   serializes across processes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StorageResult;
use crate::key::StorageKey;

#[cfg(feature = "redis-storage")]
mod redis;

#[cfg(feature = "redis-storage")]
pub use redis::RedisEventIsolation;

/// Held for the duration of one event's processing; dropping it
/// releases the underlying lock.
pub struct IsolationGuard {
    _held: Option<Box<dyn Any + Send>>,
}

impl IsolationGuard {
    /// A guard that holds nothing.
    pub fn noop() -> Self {
        Self { _held: None }
    }

    /// A guard that releases `held` when dropped.
    pub fn holding(held: impl Any + Send) -> Self {
        Self {
            _held: Some(Box::new(held)),
        }
    }
}

impl std::fmt::Debug for IsolationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationGuard")
            .field("held", &self._held.is_some())
            .finish()
    }
}

/// Serializes event processing per storage key.
#[async_trait]
pub trait EventIsolation: Send + Sync {
    /// Waits until this context is free and claims it.
    async fn lock(&self, key: &StorageKey) -> StorageResult<IsolationGuard>;

    /// Releases backend resources.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// No isolation: every lock is granted immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledIsolation;

#[async_trait]
impl EventIsolation for DisabledIsolation {
    async fn lock(&self, _key: &StorageKey) -> StorageResult<IsolationGuard> {
        Ok(IsolationGuard::noop())
    }
}

/// Process-local isolation with one async mutex per key.
///
/// Mutexes are kept for the process lifetime, so a key's lock order is
/// stable no matter how long ago the context was last seen.
#[derive(Debug, Default)]
pub struct InMemoryIsolation {
    locks: Mutex<HashMap<StorageKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl InMemoryIsolation {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

#[async_trait]
impl EventIsolation for InMemoryIsolation {
    async fn lock(&self, key: &StorageKey) -> StorageResult<IsolationGuard> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let held = lock.lock_owned().await;
        Ok(IsolationGuard::holding(held))
    }
}
