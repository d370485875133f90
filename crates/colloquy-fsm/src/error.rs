//! Error types for the conversation layer.

use thiserror::Error;

/// Errors from storage backends, key building, and isolation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A value intended for the data mapping did not serialize to a
    /// JSON object.
    #[error("conversation data must be a JSON object, got {kind}")]
    DataNotObject {
        /// The JSON kind the value actually serialized to.
        kind: &'static str,
    },

    /// A non-default destiny reached a key builder configured without
    /// destiny support.
    #[error(
        "destiny \"{destiny}\" cannot be encoded: the key builder is configured without destiny support"
    )]
    DestinyDisabled {
        /// The rejected destiny.
        destiny: String,
    },

    /// No backend is registered for the connection string's scheme.
    #[error("no storage backend registered for scheme \"{scheme}\"")]
    UnknownScheme { scheme: String },

    /// The backend exists but is not compiled into this build.
    #[error("storage backend \"{name}\" is not available: enable the \"{feature}\" cargo feature")]
    BackendUnavailable {
        name: &'static str,
        feature: &'static str,
    },

    /// The connection string could not be understood.
    #[error("invalid storage url \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// JSON (de)serialization of the data mapping failed.
    #[error("data serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis driver failure.
    #[cfg(feature = "redis-storage")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// MongoDB driver failure.
    #[cfg(feature = "mongo-storage")]
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// BSON encoding failure.
    #[cfg(feature = "mongo-storage")]
    #[error("bson encoding failed: {0}")]
    BsonEncode(#[from] mongodb::bson::ser::Error),

    /// BSON decoding failure.
    #[cfg(feature = "mongo-storage")]
    #[error("bson decoding failed: {0}")]
    BsonDecode(#[from] mongodb::bson::de::Error),
}

impl StorageError {
    /// Creates an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from state-filter construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A filter was declared with no patterns; it could never fire.
    #[error("a state filter requires at least one pattern")]
    EmptyPatternSet,
}
