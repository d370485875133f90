//! Dispatch integration.
//!
//! [`FsmMiddleware`] resolves every incoming event to its conversation
//! context before any matcher runs: it derives the [`StorageKey`] from
//! the event origin and the configured [`FsmStrategy`], serializes
//! processing for that key through an [`EventIsolation`], reads the
//! current state, and injects [`FsmContext`] and [`RawState`] for
//! filters and handlers downstream.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use colloquy_core::{DispatchError, DispatchResult, EventContext, Middleware, Next};

use crate::context::{FsmContext, RawState};
use crate::isolation::{EventIsolation, InMemoryIsolation};
use crate::key::StorageKey;
use crate::storage::Storage;
use crate::strategy::FsmStrategy;

/// Middleware that attaches conversation state to dispatch.
///
/// # Example
///
/// ```rust,ignore
/// let storage = Arc::new(MemoryStorage::default());
/// let dispatcher = Dispatcher::new()
///     .with_middleware(FsmMiddleware::new(storage))
///     .with(registration_matcher());
/// ```
pub struct FsmMiddleware {
    storage: Arc<dyn Storage>,
    isolation: Arc<dyn EventIsolation>,
    strategy: FsmStrategy,
}

impl FsmMiddleware {
    /// Middleware over `storage` with in-process isolation and the
    /// default strategy.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            isolation: Arc::new(InMemoryIsolation::new()),
            strategy: FsmStrategy::default(),
        }
    }

    /// Replaces the isolation. Use [`DisabledIsolation`] to let events
    /// for one context interleave, or a distributed isolation when
    /// several processes share the storage.
    ///
    /// [`DisabledIsolation`]: crate::isolation::DisabledIsolation
    pub fn with_isolation(mut self, isolation: impl EventIsolation + 'static) -> Self {
        self.isolation = Arc::new(isolation);
        self
    }

    /// Replaces the key-derivation strategy.
    pub fn with_strategy(mut self, strategy: FsmStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The storage contexts are read from and written to.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    fn resolve_key(&self, ctx: &EventContext) -> Option<StorageKey> {
        let origin = ctx.event().origin();
        let (chat_id, user_id, thread_id) =
            self.strategy
                .apply(origin.chat_id, origin.user_id, origin.thread_id)?;
        Some(StorageKey::new(ctx.bot().id(), chat_id, user_id).with_thread_id(thread_id))
    }
}

#[async_trait]
impl Middleware for FsmMiddleware {
    async fn handle(&self, ctx: Arc<EventContext>, next: Next<'_>) -> DispatchResult<bool> {
        let Some(key) = self.resolve_key(&ctx) else {
            trace!(
                event_name = ctx.event().event_name(),
                "Event resolves to no context, dispatching without state"
            );
            return next.run(ctx).await;
        };

        let guard = self
            .isolation
            .lock(&key)
            .await
            .map_err(DispatchError::middleware)?;

        let state = self
            .storage
            .get_state(&key)
            .await
            .map_err(DispatchError::middleware)?;
        debug!(?key, ?state, "Resolved conversation context");

        ctx.insert(RawState::new(state));
        ctx.insert(FsmContext::new(Arc::clone(&self.storage), key));

        // Hold the context until every downstream layer has finished,
        // errors included.
        let result = next.run(ctx).await;
        drop(guard);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::timeout;

    use colloquy_core::{Bot, BoxedEvent, Dispatcher, Event, EventOrigin, EventType, Matcher};

    use crate::storage::MemoryStorage;

    use super::*;

    #[derive(Debug)]
    struct ChatMessage {
        origin: EventOrigin,
    }

    impl ChatMessage {
        fn from_user(chat_id: i64, user_id: i64) -> Self {
            Self {
                origin: EventOrigin::chat_user(chat_id, user_id),
            }
        }
    }

    impl Event for ChatMessage {
        fn event_name(&self) -> &'static str {
            "chat_message"
        }

        fn event_type(&self) -> EventType {
            EventType::Message
        }

        fn origin(&self) -> EventOrigin {
            self.origin
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct SimBot(i64);

    impl Bot for SimBot {
        fn id(&self) -> i64 {
            self.0
        }
    }

    fn dispatch_args(event: ChatMessage) -> (BoxedEvent, Arc<SimBot>) {
        (BoxedEvent::new(event), Arc::new(SimBot(7)))
    }

    #[tokio::test]
    async fn test_injects_context_and_raw_state() {
        let storage = Arc::new(MemoryStorage::default());
        let key = StorageKey::new(7, -42, 42);
        storage
            .set_state(&key, Some("waiting_for_name"))
            .await
            .unwrap();

        let seen = Arc::new(AtomicBool::new(false));
        let matcher = {
            let seen = Arc::clone(&seen);
            Matcher::new()
                .name("registration")
                .handler(move |raw: RawState, fsm: FsmContext| {
                    let seen = Arc::clone(&seen);
                    async move {
                        assert_eq!(raw.as_deref(), Some("waiting_for_name"));
                        fsm.set_state("done").await.unwrap();
                        seen.store(true, Ordering::SeqCst);
                    }
                })
        };

        let dispatcher = Dispatcher::new()
            .with_middleware(FsmMiddleware::new(Arc::clone(&storage) as Arc<dyn Storage>))
            .with(matcher);

        let (event, bot) = dispatch_args(ChatMessage::from_user(-42, 42));
        let handled = dispatcher.dispatch(event, bot).await.unwrap();

        assert!(handled);
        assert!(seen.load(Ordering::SeqCst));
        assert_eq!(
            storage.get_state(&key).await.unwrap(),
            Some("done".to_string())
        );
        // Another user in the same chat has their own context.
        let other = StorageKey::new(7, -42, 99);
        assert_eq!(storage.get_state(&other).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_without_origin_skips_the_fsm() {
        let storage = Arc::new(MemoryStorage::default());

        let seen = Arc::new(AtomicBool::new(false));
        let matcher = {
            let seen = Arc::clone(&seen);
            Matcher::new().handler(move |fsm: Option<FsmContext>| {
                let seen = Arc::clone(&seen);
                async move {
                    assert!(fsm.is_none());
                    seen.store(true, Ordering::SeqCst);
                }
            })
        };

        let dispatcher = Dispatcher::new()
            .with_middleware(FsmMiddleware::new(Arc::clone(&storage) as Arc<dyn Storage>))
            .with(matcher);

        let (event, bot) = dispatch_args(ChatMessage {
            origin: EventOrigin::EMPTY,
        });
        let handled = dispatcher.dispatch(event, bot).await.unwrap();

        assert!(handled);
        assert!(seen.load(Ordering::SeqCst));
        assert_eq!(storage.record_count(), 0);
    }

    #[tokio::test]
    async fn test_strategy_reshapes_the_key() {
        let storage = Arc::new(MemoryStorage::default());

        let matcher = Matcher::new().handler(|fsm: FsmContext| async move {
            assert_eq!(fsm.key().chat_id(), -42);
            assert_eq!(fsm.key().user_id(), -42);
            fsm.set_state("group_game").await.unwrap();
        });

        let dispatcher = Dispatcher::new()
            .with_middleware(
                FsmMiddleware::new(Arc::clone(&storage) as Arc<dyn Storage>)
                    .with_strategy(FsmStrategy::Chat),
            )
            .with(matcher);

        let (event, bot) = dispatch_args(ChatMessage::from_user(-42, 42));
        dispatcher.dispatch(event, bot).await.unwrap();

        let shared = StorageKey::new(7, -42, -42);
        assert_eq!(
            storage.get_state(&shared).await.unwrap(),
            Some("group_game".to_string())
        );
    }

    #[tokio::test]
    async fn test_lock_is_released_after_a_handler_error() {
        let storage = Arc::new(MemoryStorage::default());

        let calls = Arc::new(AtomicUsize::new(0));
        let matcher = {
            let calls = Arc::clone(&calls);
            Matcher::new().handler(move |_fsm: FsmContext| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        return Err(std::io::Error::other("boom"));
                    }
                    Ok(())
                }
            })
        };

        let dispatcher = Dispatcher::new()
            .with_middleware(FsmMiddleware::new(Arc::clone(&storage) as Arc<dyn Storage>))
            .with(matcher);

        let (event, bot) = dispatch_args(ChatMessage::from_user(-42, 42));
        let failed = dispatcher.dispatch(event, bot).await;
        assert!(failed.is_err());

        // The context must be free again; a leaked lock would hang here.
        let (event, bot) = dispatch_args(ChatMessage::from_user(-42, 42));
        let retried = timeout(Duration::from_secs(1), dispatcher.dispatch(event, bot)).await;
        assert!(retried.expect("dispatch deadlocked").is_ok());
    }
}
