//! Parameter extraction for handler functions.
//!
//! Handlers declare what they need as typed parameters; each parameter
//! type implements [`FromContext`] and pulls itself out of the shared
//! [`EventContext`]. Crates layered on top implement the trait for their
//! own types (the conversation layer does this for its context), which
//! is what lets handlers stay plain async functions.

use crate::bot::BoxedBot;
use crate::context::EventContext;
use crate::error::ExtractResult;
use crate::event::BoxedEvent;

/// Types that can be produced from the dispatch context.
///
/// Extraction must be synchronous and cheap: clone a handle, read a
/// value from the data map. Anything that needs I/O belongs in the
/// handler body, not the extractor.
pub trait FromContext: Sized {
    /// Attempts to produce `Self` from the context.
    fn from_context(ctx: &EventContext) -> ExtractResult<Self>;
}

/// The event itself is always extractable.
impl FromContext for BoxedEvent {
    fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

/// The receiving bot is always extractable.
impl FromContext for BoxedBot {
    fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
        Ok(ctx.bot_arc())
    }
}

/// `Option<T>` turns a failed extraction into `None` instead of
/// skipping the handler.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use super::*;
    use crate::bot::Bot;
    use crate::error::ExtractError;
    use crate::event::Event;

    struct TestEvent;

    impl Event for TestEvent {
        fn event_name(&self) -> &'static str {
            "test"
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

    #[derive(Clone, PartialEq, Debug)]
    struct Attached(&'static str);

    impl FromContext for Attached {
        fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
            ctx.get::<Attached>()
                .ok_or_else(ExtractError::missing::<Attached>)
        }
    }

    #[test]
    fn test_builtin_extractors() {
        let ctx = EventContext::new(BoxedEvent::new(TestEvent), Arc::new(TestBot));
        let event = BoxedEvent::from_context(&ctx).unwrap();
        assert_eq!(event.event_name(), "test");
        let bot = BoxedBot::from_context(&ctx).unwrap();
        assert_eq!(bot.id(), 1);
    }

    #[test]
    fn test_option_extractor_absorbs_failure() {
        let ctx = EventContext::new(BoxedEvent::new(TestEvent), Arc::new(TestBot));
        assert!(Attached::from_context(&ctx).is_err());
        assert_eq!(Option::<Attached>::from_context(&ctx).unwrap(), None);

        ctx.insert(Attached("here"));
        assert_eq!(
            Option::<Attached>::from_context(&ctx).unwrap(),
            Some(Attached("here"))
        );
    }
}
