//! Per-dispatch context shared across the handler chain.
//!
//! One [`EventContext`] is created for every incoming event and shared as
//! an `Arc` by all middlewares, matchers, and handlers in that dispatch
//! cycle. It carries the event, the bot that received it, a propagation
//! flag, and a type-keyed data map that middlewares use to hand values
//! down to handlers (the conversation layer stores its context there).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::bot::BoxedBot;
use crate::event::BoxedEvent;

/// Shared context for one dispatch cycle.
///
/// All mutation goes through interior mutability, so the context can be
/// handed to every participant as a plain `Arc<EventContext>`.
pub struct EventContext {
    /// The event being dispatched.
    event: BoxedEvent,

    /// The bot that received the event.
    bot: BoxedBot,

    /// Whether dispatch should continue to further matchers.
    is_propagating: AtomicBool,

    /// Values attached by middlewares for handlers, keyed by type.
    data: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl EventContext {
    /// Creates a new context for one event/bot pair.
    pub fn new(event: BoxedEvent, bot: BoxedBot) -> Self {
        Self {
            event,
            bot,
            is_propagating: AtomicBool::new(true),
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the event being dispatched.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// Returns the bot that received the event.
    pub fn bot(&self) -> &BoxedBot {
        &self.bot
    }

    /// Returns a cloned handle to the bot.
    pub fn bot_arc(&self) -> BoxedBot {
        Arc::clone(&self.bot)
    }

    /// Stops propagation to matchers that have not run yet.
    ///
    /// Handlers already executing are unaffected.
    pub fn stop_propagation(&self) {
        self.is_propagating.store(false, Ordering::SeqCst);
    }

    /// Whether dispatch should continue to further matchers.
    pub fn is_propagating(&self) -> bool {
        self.is_propagating.load(Ordering::SeqCst)
    }

    /// Stores a value in the data map, keyed by its type.
    ///
    /// One value per type; storing again overwrites the previous value.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.data.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a clone of a previously stored value.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.data
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Whether a value of the given type has been stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.data.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a previously stored value.
    pub fn remove<T: 'static>(&self) -> Option<T> {
        self.data
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &self.event)
            .field("is_propagating", &self.is_propagating())
            .finish_non_exhaustive()
    }
}
