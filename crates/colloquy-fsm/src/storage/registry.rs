//! Scheme-based storage construction.
//!
//! Lets configuration pick a backend with a connection string
//! (`memory://`, `redis://…`, `mongodb://…`) instead of a concrete
//! type.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::{MemoryStorage, Storage};
use crate::error::{StorageError, StorageResult};

/// Builds a storage from a full connection string.
pub type StorageFactory =
    Arc<dyn Fn(String) -> BoxFuture<'static, StorageResult<Arc<dyn Storage>>> + Send + Sync>;

/// Maps URL schemes to storage factories.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    factories: HashMap<String, StorageFactory>,
}

impl StorageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every compiled-in backend registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("memory", |_url| {
            Box::pin(async { Ok(Arc::new(MemoryStorage::default()) as Arc<dyn Storage>) })
        });
        #[cfg(feature = "redis-storage")]
        for scheme in ["redis", "rediss"] {
            registry.register(scheme, |url| {
                Box::pin(async move {
                    let storage = super::RedisStorage::from_url(&url).await?;
                    Ok(Arc::new(storage) as Arc<dyn Storage>)
                })
            });
        }
        #[cfg(feature = "mongo-storage")]
        for scheme in ["mongodb", "mongodb+srv"] {
            registry.register(scheme, |url| {
                Box::pin(async move {
                    let storage = super::MongoStorage::from_url(&url).await?;
                    Ok(Arc::new(storage) as Arc<dyn Storage>)
                })
            });
        }
        registry
    }

    /// Registers (or replaces) the factory for a scheme.
    pub fn register<F>(&mut self, scheme: impl Into<String>, factory: F)
    where
        F: Fn(String) -> BoxFuture<'static, StorageResult<Arc<dyn Storage>>>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .insert(scheme.into().to_ascii_lowercase(), Arc::new(factory));
    }

    /// Opens a storage from its connection string.
    pub async fn open(&self, url: &str) -> StorageResult<Arc<dyn Storage>> {
        let (scheme, _) = url
            .split_once("://")
            .ok_or_else(|| StorageError::invalid_url(url, "missing \"scheme://\" prefix"))?;
        let scheme = scheme.to_ascii_lowercase();
        match self.factories.get(&scheme) {
            Some(factory) => (factory.as_ref())(url.to_string()).await,
            None => Err(match scheme.as_str() {
                "redis" | "rediss" => StorageError::BackendUnavailable {
                    name: "redis",
                    feature: "redis-storage",
                },
                "mongodb" | "mongodb+srv" => StorageError::BackendUnavailable {
                    name: "mongodb",
                    feature: "mongo-storage",
                },
                _ => StorageError::UnknownScheme { scheme },
            }),
        }
    }
}

impl std::fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.factories.keys().collect();
        schemes.sort();
        f.debug_struct("StorageRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}
