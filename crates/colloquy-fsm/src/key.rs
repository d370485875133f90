//! Conversation addressing.

use std::sync::Arc;

/// The namespace tag a key gets when none is requested explicitly.
pub const DEFAULT_DESTINY: &str = "default";

/// The composite address of one conversation's state slot.
///
/// A key pins down *whose* conversation a state record belongs to: the
/// bot that is having it, the chat it happens in, the user it is with,
/// optionally the forum topic, and a `destiny` namespace that lets
/// independent features keep separate state for the same people.
///
/// Two keys are equal iff all five fields are equal, so keys work
/// directly as map keys. Keys are immutable; the scoping helpers return
/// a modified copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    bot_id: i64,
    chat_id: i64,
    user_id: i64,
    thread_id: Option<i64>,
    destiny: Arc<str>,
}

impl StorageKey {
    /// Creates a key for the default destiny with no thread.
    pub fn new(bot_id: i64, chat_id: i64, user_id: i64) -> Self {
        Self {
            bot_id,
            chat_id,
            user_id,
            thread_id: None,
            destiny: Arc::from(DEFAULT_DESTINY),
        }
    }

    /// Returns a copy scoped to the given forum topic.
    pub fn with_thread_id(mut self, thread_id: Option<i64>) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Returns a copy addressing an independent state slot of the same
    /// conversation.
    pub fn with_destiny(mut self, destiny: impl Into<Arc<str>>) -> Self {
        self.destiny = destiny.into();
        self
    }

    /// The bot this conversation belongs to.
    pub fn bot_id(&self) -> i64 {
        self.bot_id
    }

    /// The chat the conversation happens in.
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// The user the conversation is with.
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// The forum topic, if the conversation is scoped to one.
    pub fn thread_id(&self) -> Option<i64> {
        self.thread_id
    }

    /// The namespace this key addresses.
    pub fn destiny(&self) -> &str {
        &self.destiny
    }
}
