//! In-memory storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{StateData, Storage};
use crate::error::StorageResult;
use crate::key::StorageKey;

#[derive(Debug, Default, Clone)]
struct MemoryRecord {
    state: Option<String>,
    data: StateData,
}

impl MemoryRecord {
    fn is_empty(&self) -> bool {
        self.state.is_none() && self.data.is_empty()
    }
}

/// Storage backed by a process-local map.
///
/// The default and test backend: no persistence, no network failure
/// modes, everything gone on process exit. Records are created lazily
/// on first write and removed once both state and data are empty again,
/// so the map only holds conversations that are actually mid-flight.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<StorageKey, MemoryRecord>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<R>(&self, key: &StorageKey, f: impl FnOnce(&mut MemoryRecord) -> R) -> R {
        let mut records = self.records.lock();
        let record = records.entry(key.clone()).or_default();
        let out = f(record);
        if record.is_empty() {
            records.remove(key);
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn record_count(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_state(&self, key: &StorageKey) -> StorageResult<Option<String>> {
        Ok(self
            .records
            .lock()
            .get(key)
            .and_then(|record| record.state.clone()))
    }

    async fn set_state(&self, key: &StorageKey, state: Option<&str>) -> StorageResult<()> {
        self.mutate(key, |record| record.state = state.map(str::to_owned));
        Ok(())
    }

    async fn get_data(&self, key: &StorageKey) -> StorageResult<StateData> {
        Ok(self
            .records
            .lock()
            .get(key)
            .map(|record| record.data.clone())
            .unwrap_or_default())
    }

    async fn set_data(&self, key: &StorageKey, data: StateData) -> StorageResult<()> {
        self.mutate(key, |record| record.data = data);
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
