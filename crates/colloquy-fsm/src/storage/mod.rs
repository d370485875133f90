//! Storage backends for conversation state.
//!
//! Each conversation key owns one logical record with two independent
//! fields: the current state (a canonical string or absent) and a data
//! mapping (JSON object). [`Storage`] is the capability every backend
//! provides; records come into being lazily on first write and backends
//! may reclaim the physical record once both fields are empty, so
//! "never existed" and "cleared" look identical to readers.
//!
//! Backends are deliberately dumb: no caching, no locking. Concurrency
//! control around read-modify-write cycles belongs to the isolation
//! layer (see [`crate::isolation`]).

mod key_builder;
mod memory;
#[cfg(feature = "mongo-storage")]
mod mongo;
#[cfg(feature = "redis-storage")]
mod redis;
mod registry;

pub use key_builder::{DEFAULT_KEY_PREFIX, DefaultKeyBuilder, KeyBuilder, KeyPart};
pub use memory::MemoryStorage;
#[cfg(feature = "mongo-storage")]
pub use mongo::MongoStorage;
#[cfg(feature = "redis-storage")]
pub use redis::RedisStorage;
pub use registry::{StorageFactory, StorageRegistry};

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StorageError, StorageResult};
use crate::key::StorageKey;

/// The data mapping persisted alongside a conversation's state.
pub type StateData = HashMap<String, Value>;

/// Serializes an arbitrary value into a [`StateData`] mapping.
///
/// Fails with [`StorageError::DataNotObject`] when the value serializes
/// to anything other than a JSON object; the record's data field must
/// stay a mapping for partial reads and merges to make sense.
pub fn to_state_data<T: Serialize>(value: &T) -> StorageResult<StateData> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(StorageError::DataNotObject {
            kind: value_kind(&other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The capability set every storage backend provides.
///
/// State and data are fully independent: writing or clearing one never
/// touches the other. All operations are addressed by [`StorageKey`]
/// and must not assume the record exists.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads the current state for a key; `None` when unset.
    async fn get_state(&self, key: &StorageKey) -> StorageResult<Option<String>>;

    /// Writes (or, with `None`, clears) the state for a key.
    async fn set_state(&self, key: &StorageKey, state: Option<&str>) -> StorageResult<()>;

    /// Reads the data mapping for a key; an empty map when no record
    /// exists.
    async fn get_data(&self, key: &StorageKey) -> StorageResult<StateData>;

    /// Replaces the data mapping wholesale. Writing an empty map may
    /// reclaim the record.
    async fn set_data(&self, key: &StorageKey, data: StateData) -> StorageResult<()>;

    /// Merges `data` into the stored mapping, key-wise with new values
    /// winning, and returns the merged result.
    ///
    /// The default implementation is read-modify-write and therefore
    /// not atomic under concurrent writers to the same key; run it
    /// under event isolation, or use a backend that overrides it with a
    /// native partial update.
    async fn update_data(&self, key: &StorageKey, data: StateData) -> StorageResult<StateData> {
        let mut merged = self.get_data(key).await?;
        merged.extend(data);
        self.set_data(key, merged.clone()).await?;
        Ok(merged)
    }

    /// Reads a single field of the data mapping.
    ///
    /// The default reads the whole mapping; backends with projection
    /// support override this to fetch just the field.
    async fn get_value(&self, key: &StorageKey, field: &str) -> StorageResult<Option<Value>> {
        let mut data = self.get_data(key).await?;
        Ok(data.remove(field))
    }

    /// Releases the backend's resources.
    async fn close(&self) -> StorageResult<()>;
}

impl std::fmt::Debug for dyn Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Storage")
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Profile {
        name: &'static str,
        age: u32,
    }

    #[test]
    fn test_to_state_data_accepts_objects() {
        let data = to_state_data(&Profile {
            name: "alice",
            age: 30,
        })
        .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["name"], Value::from("alice"));
        assert_eq!(data["age"], Value::from(30));
    }

    #[test]
    fn test_to_state_data_rejects_non_objects() {
        let err = to_state_data(&42).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DataNotObject { kind: "number" }
        ));

        let err = to_state_data(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, StorageError::DataNotObject { kind: "array" }));
    }
}
