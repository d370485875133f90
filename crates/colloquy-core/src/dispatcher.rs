//! The dispatch cycle.
//!
//! A [`Dispatcher`] takes one event at a time and walks it through two
//! stages:
//!
//! 1. the middleware chain, outermost first, which can enrich the
//!    context or refuse the event entirely
//! 2. the matcher loop, in registration order; every matcher whose
//!    checks pass runs its handlers, and a blocking matcher that fired
//!    ends the loop
//!
//! ```rust,ignore
//! use colloquy_core::{Dispatcher, Matcher, on_message};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_middleware(fsm_middleware);
//! dispatcher.add(on_message().block(true).handler(echo_handler));
//! dispatcher.add(Matcher::new().handler(fallback_handler));
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{Instrument, Level, debug, span};

use crate::bot::BoxedBot;
use crate::context::EventContext;
use crate::error::DispatchResult;
use crate::event::BoxedEvent;
use crate::matcher::Matcher;
use crate::middleware::{Middleware, Next};

/// Routes events through middlewares to matchers.
///
/// Cloning is cheap (matchers share their internals behind an `Arc`),
/// and the dispatcher itself is `Send + Sync`, so adapters on separate
/// tasks can feed the same instance.
#[derive(Default, Clone)]
pub struct Dispatcher {
    matchers: Vec<Matcher>,
    // First registered sits outermost around the matcher loop.
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    /// Appends a matcher; the loop visits matchers in this order.
    pub fn add(&mut self, matcher: Matcher) {
        self.matchers.push(matcher);
    }

    /// Chaining form of [`add`](Self::add).
    pub fn with(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Wraps the matcher loop in another middleware layer.
    pub fn add_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Chaining form of [`add_middleware`](Self::add_middleware).
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn matcher_count(&self) -> usize {
        self.matchers.len()
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Drops every registered matcher, keeping the middlewares.
    pub fn clear(&mut self) {
        self.matchers.clear();
    }

    /// Dispatches an event through the middleware chain to the matchers.
    ///
    /// Returns `Ok(true)` if any matcher processed the event. Handler and
    /// middleware errors abort the cycle and surface here; the matchers
    /// that already ran are not rolled back.
    pub async fn dispatch(&self, event: BoxedEvent, bot: BoxedBot) -> DispatchResult<bool> {
        let span = span!(Level::DEBUG, "dispatch", event_name = %event.event_name());
        let ctx = Arc::new(EventContext::new(event, bot));

        // The endpoint owns a snapshot of the matcher list so the chain
        // future stays 'static.
        let matchers: Arc<[Matcher]> = Arc::from(self.matchers.as_slice());
        let endpoint = move |ctx: Arc<EventContext>| -> BoxFuture<'static, DispatchResult<bool>> {
            let matchers = Arc::clone(&matchers);
            Box::pin(async move { run_matchers(&matchers, ctx).await })
        };

        Next::new(&self.middlewares, &endpoint)
            .run(ctx)
            .instrument(span)
            .await
    }
}

async fn run_matchers(matchers: &[Matcher], ctx: Arc<EventContext>) -> DispatchResult<bool> {
    let mut any_matched = false;

    for matcher in matchers {
        if !ctx.is_propagating() {
            debug!("Propagation stopped, ending dispatch");
            break;
        }

        if matcher.execute(Arc::clone(&ctx)).await? {
            any_matched = true;

            if matcher.is_blocking() {
                debug!(
                    matcher = matcher.get_name().unwrap_or("<anonymous>"),
                    "Matched a blocking matcher, skipping the rest"
                );
                break;
            }
        }
    }

    Ok(any_matched)
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("matcher_count", &self.matchers.len())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::bot::Bot;
    use crate::error::{DispatchError, ExtractError, ExtractResult};
    use crate::event::Event;
    use crate::extract::FromContext;

    #[derive(Clone)]
    struct TestEvent {
        name: &'static str,
    }

    impl Event for TestEvent {
        fn event_name(&self) -> &'static str {
            self.name
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct MockBot;

    impl Bot for MockBot {
        fn id(&self) -> i64 {
            1
        }
    }

    fn mock_bot() -> BoxedBot {
        Arc::new(MockBot)
    }

    fn test_event() -> BoxedEvent {
        BoxedEvent::new(TestEvent { name: "test" })
    }

    #[tokio::test]
    async fn test_dispatch_no_matchers() {
        let dispatcher = Dispatcher::new();
        let matched = dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn test_dispatch_with_matcher() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut dispatcher = Dispatcher::new();
        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let matched = dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();

        assert!(matched);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocking_matcher_stops_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter1 = Arc::clone(&counter);
        let counter2 = Arc::clone(&counter);

        let mut dispatcher = Dispatcher::new();

        dispatcher.add(Matcher::new().block(true).handler(move || {
            let c = Arc::clone(&counter1);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter2);
            async move {
                c.fetch_add(100, Ordering::SeqCst);
            }
        }));

        dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();

        // The second matcher sits behind the blocking one.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_blocking_matchers_all_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter1 = Arc::clone(&counter);
        let counter2 = Arc::clone(&counter);

        let mut dispatcher = Dispatcher::new();

        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter1);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter2);
            async move {
                c.fetch_add(100, Ordering::SeqCst);
            }
        }));

        dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 101);
    }

    #[tokio::test]
    async fn test_handler_error_surfaces() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add(Matcher::new().handler(|| async {
            Err::<(), std::io::Error>(std::io::Error::other("boom"))
        }));

        let err = dispatcher
            .dispatch(test_event(), mock_bot())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
    }

    // ------------------------------------------------------------------
    // Middleware integration
    // ------------------------------------------------------------------

    #[derive(Clone, PartialEq, Debug)]
    struct Injected(&'static str);

    impl FromContext for Injected {
        fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
            ctx.get::<Injected>()
                .ok_or_else(ExtractError::missing::<Injected>)
        }
    }

    struct Injector;

    #[async_trait]
    impl Middleware for Injector {
        async fn handle(&self, ctx: Arc<EventContext>, next: Next<'_>) -> DispatchResult<bool> {
            ctx.insert(Injected("from middleware"));
            next.run(ctx).await
        }
    }

    struct Suppressor;

    #[async_trait]
    impl Middleware for Suppressor {
        async fn handle(&self, _ctx: Arc<EventContext>, _next: Next<'_>) -> DispatchResult<bool> {
            Ok(false)
        }
    }

    struct Stopper;

    #[async_trait]
    impl Middleware for Stopper {
        async fn handle(&self, ctx: Arc<EventContext>, next: Next<'_>) -> DispatchResult<bool> {
            ctx.stop_propagation();
            next.run(ctx).await
        }
    }

    #[tokio::test]
    async fn test_middleware_injects_for_handlers() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(Injector);
        dispatcher.add(Matcher::new().handler(move |value: Injected| {
            let seen = Arc::clone(&seen_clone);
            async move {
                *seen.lock() = Some(value);
            }
        }));

        let matched = dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();
        assert!(matched);
        assert_eq!(*seen.lock(), Some(Injected("from middleware")));
    }

    #[tokio::test]
    async fn test_stop_propagation_ends_matcher_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(Stopper);
        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let matched = dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();
        assert!(!matched);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_middleware_can_suppress_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut dispatcher = Dispatcher::new();
        dispatcher.add_middleware(Suppressor);
        dispatcher.add(Matcher::new().handler(move || {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let matched = dispatcher.dispatch(test_event(), mock_bot()).await.unwrap();
        assert!(!matched);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
