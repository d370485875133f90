//! Matchers route events to handlers.
//!
//! A [`Matcher`] pairs a list of checks with a list of handlers: when an
//! event passes every check, the handlers run in registration order. A
//! blocking matcher that fired stops the dispatch loop, which is how
//! "first matching route wins" setups are built.
//!
//! Checks compose by conjunction, so routing layers can stack their own
//! conditions onto a matcher (the conversation layer adds state checks
//! this way) without knowing about each other.
//!
//! # Example
//!
//! ```rust,ignore
//! use colloquy_core::{Matcher, on_message};
//!
//! let matcher = on_message()
//!     .name("greeter")
//!     .check(|ctx| ctx.event().event_name() == "group_message")
//!     .handler(my_handler)
//!     .block(true);
//! ```

use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::EventContext;
use crate::error::{DispatchError, DispatchResult};
use crate::event::{Event, EventType};
use crate::handler::{BoxedHandler, Handler};

/// A predicate deciding whether a matcher fires for an event.
pub type CheckFn = Arc<dyn Fn(&EventContext) -> bool + Send + Sync>;

#[derive(Clone)]
struct MatcherInner {
    /// All checks must pass for the matcher to fire.
    checks: Vec<CheckFn>,
    /// Handlers executed in order once the checks pass.
    handlers: Vec<BoxedHandler>,
    /// Whether a successful match stops further matchers.
    block: bool,
    /// Optional name for logs.
    name: Option<String>,
}

/// An event route: checks plus handlers.
///
/// Cheap to clone; the builder methods copy-on-write through
/// [`Arc::make_mut`], so clones taken before a modification are
/// unaffected by it.
#[derive(Clone)]
pub struct Matcher {
    inner: Arc<MatcherInner>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    /// Creates a matcher with no checks (matches everything) and no
    /// handlers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MatcherInner {
                checks: Vec::new(),
                handlers: Vec::new(),
                block: false,
                name: None,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut MatcherInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Names the matcher for logging.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner_mut().name = Some(name.into());
        self
    }

    /// Adds a check; every check must pass for the matcher to fire.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&EventContext) -> bool + Send + Sync + 'static,
    {
        self.inner_mut().checks.push(Arc::new(check));
        self
    }

    /// Restricts the matcher to events of one concrete type.
    pub fn on<E: Event + 'static>(self) -> Self {
        self.check(|ctx| ctx.event().is::<E>())
    }

    /// Sets whether a successful match stops further matchers.
    pub fn block(mut self, block: bool) -> Self {
        self.inner_mut().block = block;
        self
    }

    /// Appends a handler function.
    pub fn handler<F, T>(mut self, handler: F) -> Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.inner_mut().handlers.push(BoxedHandler::new(handler));
        self
    }

    /// Appends an already type-erased handler.
    pub fn handler_boxed(mut self, handler: BoxedHandler) -> Self {
        self.inner_mut().handlers.push(handler);
        self
    }

    /// Whether every check passes for the event.
    pub fn matches(&self, ctx: &EventContext) -> bool {
        self.inner.checks.iter().all(|check| check(ctx))
    }

    /// Whether a successful match stops further matchers.
    pub fn is_blocking(&self) -> bool {
        self.inner.block
    }

    /// The number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// The matcher's name, if set.
    pub fn get_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Runs the matcher against an event.
    ///
    /// Returns `Ok(true)` when the checks passed and all handlers ran,
    /// `Ok(false)` when a check rejected the event. A handler error
    /// aborts the remaining handlers and surfaces as a dispatch error.
    pub async fn execute(&self, ctx: Arc<EventContext>) -> DispatchResult<bool> {
        if !self.matches(&ctx) {
            trace!(
                matcher = self.get_name().unwrap_or("<anonymous>"),
                "Checks rejected event"
            );
            return Ok(false);
        }

        debug!(
            matcher = self.get_name().unwrap_or("<anonymous>"),
            handlers = self.handler_count(),
            "Matcher fired"
        );

        for handler in &self.inner.handlers {
            handler
                .call(Arc::clone(&ctx))
                .await
                .map_err(DispatchError::Handler)?;
        }

        Ok(true)
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.inner.name)
            .field("checks", &self.inner.checks.len())
            .field("handlers", &self.inner.handlers.len())
            .field("block", &self.inner.block)
            .finish()
    }
}

// ============================================================================
// Matcher Builders
// ============================================================================

/// A matcher firing on any message-type event.
pub fn on_message() -> Matcher {
    Matcher::new().check(|ctx| ctx.event().event_type() == EventType::Message)
}

/// A matcher firing on events of the given classification.
pub fn on_event_type(event_type: EventType) -> Matcher {
    Matcher::new().check(move |ctx| ctx.event().event_type() == event_type)
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::bot::Bot;
    use crate::event::BoxedEvent;

    struct TestMessage;

    impl Event for TestMessage {
        fn event_name(&self) -> &'static str {
            "test_message"
        }

        fn event_type(&self) -> EventType {
            EventType::Message
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct TestNotice;

    impl Event for TestNotice {
        fn event_name(&self) -> &'static str {
            "test_notice"
        }

        fn event_type(&self) -> EventType {
            EventType::Notice
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct TestBot;

    impl Bot for TestBot {
        fn id(&self) -> i64 {
            1
        }
    }

    fn context(event: impl Event + 'static) -> Arc<EventContext> {
        Arc::new(EventContext::new(BoxedEvent::new(event), Arc::new(TestBot)))
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> impl Handler<()> {
        let counter = Arc::clone(counter);
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_empty_matcher_matches_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        let matcher = Matcher::new().handler(counting_handler(&counter));

        assert!(matcher.execute(context(TestMessage)).await.unwrap());
        assert!(matcher.execute(context(TestNotice)).await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_checks_are_conjunctive() {
        let counter = Arc::new(AtomicUsize::new(0));
        let matcher = on_message()
            .check(|ctx| ctx.event().event_name() == "test_message")
            .handler(counting_handler(&counter));

        assert!(matcher.execute(context(TestMessage)).await.unwrap());
        // Message type passes the first check but not the second.
        let other = on_message().check(|_| false).handler(counting_handler(&counter));
        assert!(!other.execute(context(TestMessage)).await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_event_type_check_rejects() {
        let counter = Arc::new(AtomicUsize::new(0));
        let matcher = on_message().handler(counting_handler(&counter));

        assert!(!matcher.execute(context(TestNotice)).await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_on_concrete_type() {
        let matcher = Matcher::new().on::<TestNotice>();
        assert!(matcher.matches(&context(TestNotice)));
        assert!(!matcher.matches(&context(TestMessage)));
    }

    #[tokio::test]
    async fn test_handlers_run_in_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);

        let matcher = Matcher::new()
            .handler(move || {
                let order = Arc::clone(&first);
                async move {
                    order.lock().push(1);
                }
            })
            .handler(move || {
                let order = Arc::clone(&second);
                async move {
                    order.lock().push(2);
                }
            });

        matcher.execute(context(TestMessage)).await.unwrap();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_handler_error_aborts_remaining() {
        let counter = Arc::new(AtomicUsize::new(0));
        let matcher = Matcher::new()
            .handler(|| async { Err::<(), std::io::Error>(std::io::Error::other("first")) })
            .handler(counting_handler(&counter));

        let err = matcher.execute(context(TestMessage)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let original = Matcher::new().name("original");
        let modified = original.clone().name("modified");

        assert_eq!(original.get_name(), Some("original"));
        assert_eq!(modified.get_name(), Some("modified"));
    }
}
