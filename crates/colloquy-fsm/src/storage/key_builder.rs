//! Key derivation for string-keyed backends.
//!
//! Backends like Redis flatten the structured [`StorageKey`] into one
//! string per record field. The builder is deterministic: the same key,
//! part, and configuration always produce the same string, and distinct
//! keys never collide under a fixed configuration.

use crate::error::{StorageError, StorageResult};
use crate::key::{DEFAULT_DESTINY, StorageKey};

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "fsm";

/// Which record field a derived key addresses.
///
/// `Lock` lives in its own namespace so isolation locks can never
/// collide with state or data entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    /// The state field.
    State,
    /// The data mapping field.
    Data,
    /// The isolation lock slot.
    Lock,
}

impl KeyPart {
    /// The suffix appended to derived keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Data => "data",
            Self::Lock => "lock",
        }
    }
}

/// Derives backend string keys from a [`StorageKey`].
pub trait KeyBuilder: Send + Sync {
    /// Builds the string key addressing `part` of the record, or the
    /// whole record when `part` is `None` (document stores keep both
    /// fields under one key).
    fn build(&self, key: &StorageKey, part: Option<KeyPart>) -> StorageResult<String>;
}

/// The standard delimited key builder.
///
/// Produces `prefix[:bot][:chat][:user][:thread][:destiny][:part]` with
/// a configurable separator. The field order is fixed; the optional
/// segments appear only when enabled, so keys stay stable across
/// releases and across processes sharing one backend.
#[derive(Debug, Clone)]
pub struct DefaultKeyBuilder {
    prefix: String,
    separator: String,
    with_bot_id: bool,
    with_thread_id: bool,
    with_destiny: bool,
}

impl Default for DefaultKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultKeyBuilder {
    /// A builder with the standard settings: `fsm` prefix, `:`
    /// separator, thread ids included, bot id and destiny omitted.
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            separator: ":".to_string(),
            with_bot_id: false,
            with_thread_id: true,
            with_destiny: false,
        }
    }

    /// Sets the leading prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the separator between key parts.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Embeds the bot id, for storage shared between bot instances.
    pub fn with_bot_id(mut self, enabled: bool) -> Self {
        self.with_bot_id = enabled;
        self
    }

    /// Embeds the thread id when the key carries one.
    pub fn with_thread_id(mut self, enabled: bool) -> Self {
        self.with_thread_id = enabled;
        self
    }

    /// Embeds the destiny namespace. Without this, keys for
    /// non-default destinies are refused rather than silently merged
    /// into the default slot.
    pub fn with_destiny(mut self, enabled: bool) -> Self {
        self.with_destiny = enabled;
        self
    }
}

impl KeyBuilder for DefaultKeyBuilder {
    fn build(&self, key: &StorageKey, part: Option<KeyPart>) -> StorageResult<String> {
        let mut parts: Vec<String> = Vec::with_capacity(7);
        parts.push(self.prefix.clone());
        if self.with_bot_id {
            parts.push(key.bot_id().to_string());
        }
        parts.push(key.chat_id().to_string());
        parts.push(key.user_id().to_string());
        if self.with_thread_id && let Some(thread_id) = key.thread_id() {
            parts.push(thread_id.to_string());
        }
        if self.with_destiny {
            parts.push(key.destiny().to_string());
        } else if key.destiny() != DEFAULT_DESTINY {
            return Err(StorageError::DestinyDisabled {
                destiny: key.destiny().to_string(),
            });
        }
        if let Some(part) = part {
            parts.push(part.as_str().to_string());
        }
        Ok(parts.join(&self.separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StorageKey {
        StorageKey::new(7, -42, 42)
    }

    #[test]
    fn test_default_layout() {
        let builder = DefaultKeyBuilder::new();
        assert_eq!(
            builder.build(&key(), Some(KeyPart::State)).unwrap(),
            "fsm:-42:42:state"
        );
        assert_eq!(
            builder.build(&key(), Some(KeyPart::Data)).unwrap(),
            "fsm:-42:42:data"
        );
        assert_eq!(builder.build(&key(), None).unwrap(), "fsm:-42:42");
    }

    #[test]
    fn test_bot_id_opt_in() {
        let builder = DefaultKeyBuilder::new().with_bot_id(true);
        assert_eq!(
            builder.build(&key(), Some(KeyPart::State)).unwrap(),
            "fsm:7:-42:42:state"
        );
    }

    #[test]
    fn test_thread_id_included_when_present() {
        let builder = DefaultKeyBuilder::new();
        let threaded = key().with_thread_id(Some(5));
        assert_eq!(
            builder.build(&threaded, Some(KeyPart::State)).unwrap(),
            "fsm:-42:42:5:state"
        );

        let no_threads = DefaultKeyBuilder::new().with_thread_id(false);
        assert_eq!(
            no_threads.build(&threaded, Some(KeyPart::State)).unwrap(),
            "fsm:-42:42:state"
        );
    }

    #[test]
    fn test_destiny_opt_in() {
        let builder = DefaultKeyBuilder::new().with_destiny(true);
        assert_eq!(
            builder.build(&key(), Some(KeyPart::Data)).unwrap(),
            "fsm:-42:42:default:data"
        );
        let scoped = key().with_destiny("history");
        assert_eq!(
            builder.build(&scoped, Some(KeyPart::Data)).unwrap(),
            "fsm:-42:42:history:data"
        );
    }

    #[test]
    fn test_non_default_destiny_refused_when_disabled() {
        let builder = DefaultKeyBuilder::new();
        let scoped = key().with_destiny("history");
        let err = builder.build(&scoped, Some(KeyPart::State)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DestinyDisabled { destiny } if destiny == "history"
        ));
    }

    #[test]
    fn test_custom_prefix_and_separator() {
        let builder = DefaultKeyBuilder::new()
            .with_prefix("bot")
            .with_separator("/");
        assert_eq!(
            builder.build(&key(), Some(KeyPart::Lock)).unwrap(),
            "bot/-42/42/lock"
        );
    }

    #[test]
    fn test_deterministic() {
        let builder = DefaultKeyBuilder::new().with_bot_id(true).with_destiny(true);
        let threaded = key().with_thread_id(Some(5));
        let first = builder.build(&threaded, Some(KeyPart::Data)).unwrap();
        let second = builder.build(&threaded, Some(KeyPart::Data)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "fsm:7:-42:42:5:default:data");
    }
}
