//! What the dispatcher knows about an event.
//!
//! Deliberately little: a name for logging, a coarse [`EventType`] for
//! matchers, and an [`EventOrigin`] for conversation addressing. The
//! platform payload stays on the concrete type behind a [`BoxedEvent`]
//! and comes back out by downcasting.

use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

// ============================================================================
// Event kinds
// ============================================================================

/// Coarse category a matcher can filter on without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Someone wrote something, in private or in a group.
    Message,
    /// The platform reports a change: edits, deletions, members coming
    /// and going.
    Notice,
    /// Something awaits approval, like a join request.
    Request,
    /// Platform plumbing such as heartbeats and lifecycle signals.
    Meta,
    /// Anything the adapter could not classify.
    Other,
}

// ============================================================================
// Event Origin
// ============================================================================

/// The identifiers an event carries about where it happened.
///
/// Every field is optional: channel posts have no user, some service
/// events have no chat, and only forum messages carry a thread. The
/// conversation layer decides what a partial origin means; the event
/// just reports what it knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOrigin {
    /// The chat the event happened in, if any.
    pub chat_id: Option<i64>,
    /// The user that triggered the event, if any.
    pub user_id: Option<i64>,
    /// The forum topic within the chat, if any.
    pub thread_id: Option<i64>,
}

impl EventOrigin {
    /// An origin with no identifiers at all.
    pub const EMPTY: Self = Self {
        chat_id: None,
        user_id: None,
        thread_id: None,
    };

    /// Origin for a user acting inside a chat.
    pub fn chat_user(chat_id: i64, user_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id),
            user_id: Some(user_id),
            thread_id: None,
        }
    }

    /// Adds a forum-topic thread to the origin.
    pub fn with_thread(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Whether the origin carries no identifiers.
    pub fn is_empty(&self) -> bool {
        self.chat_id.is_none() && self.user_id.is_none() && self.thread_id.is_none()
    }
}

// ============================================================================
// The Event trait
// ============================================================================

/// Implemented by adapters for every platform event they produce.
///
/// Only `event_name` and `as_any` are required; the defaults make an
/// event invisible to type filters and to conversation state, which is
/// the right behavior for plumbing events.
///
/// # Example
///
/// ```rust,ignore
/// use colloquy_core::{Event, EventOrigin, EventType};
///
/// struct GroupMessage {
///     chat_id: i64,
///     user_id: i64,
///     text: String,
/// }
///
/// impl Event for GroupMessage {
///     fn event_name(&self) -> &'static str {
///         "group_message"
///     }
///
///     fn event_type(&self) -> EventType {
///         EventType::Message
///     }
///
///     fn origin(&self) -> EventOrigin {
///         EventOrigin::chat_user(self.chat_id, self.user_id)
///     }
///
///     fn as_any(&self) -> &dyn std::any::Any {
///         self
///     }
/// }
/// ```
pub trait Event: Any + Send + Sync {
    /// Short stable name, used in logs and spans.
    fn event_name(&self) -> &'static str;

    fn event_type(&self) -> EventType {
        EventType::Other
    }

    /// Where the event happened. An empty origin keeps the event out
    /// of conversation state entirely.
    fn origin(&self) -> EventOrigin {
        EventOrigin::EMPTY
    }

    /// Escape hatch for [`BoxedEvent::downcast_ref`].
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Type-erased events
// ============================================================================

/// An event with its concrete type erased, cheap to clone and share.
///
/// Derefs to `dyn Event`, so the common surface reads naturally:
/// `event.event_name()`, `event.origin()`. Handlers that need the
/// platform payload call [`downcast_ref`](Self::downcast_ref).
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// The concrete event, if it is an `E`.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    pub fn is<E: Event + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}

impl Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_name", &self.event_name())
            .field("event_type", &self.event_type())
            .finish()
    }
}
