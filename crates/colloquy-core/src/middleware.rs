//! Middleware chain for the Colloquy dispatcher.
//!
//! A [`Middleware`] wraps the *entire* matcher chain for one event: it
//! sees the context before any matcher runs, decides whether to continue
//! via [`Next`], and observes the chain's result on the way back out.
//! That bracketing is the point — the conversation layer uses it to hold
//! a per-conversation lock across every handler that runs for an event.
//!
//! Middlewares run in registration order, first registered outermost.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::EventContext;
use crate::error::DispatchResult;

/// The function a middleware chain bottoms out in: the matcher loop.
pub(crate) type Endpoint =
    dyn Fn(Arc<EventContext>) -> BoxFuture<'static, DispatchResult<bool>> + Send + Sync;

/// A hook wrapping the whole matcher chain for one event.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles one dispatch cycle.
    ///
    /// Implementations call `next.run(ctx)` to continue the chain (or
    /// skip the call to short-circuit) and may inspect or replace the
    /// result. `next` is consumed, so the chain cannot be run twice.
    async fn handle(&self, ctx: Arc<EventContext>, next: Next<'_>) -> DispatchResult<bool>;
}

/// The remainder of the middleware chain, ending in the matcher loop.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    endpoint: &'a Endpoint,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middlewares: &'a [Arc<dyn Middleware>], endpoint: &'a Endpoint) -> Self {
        Self {
            middlewares,
            endpoint,
        }
    }

    /// Runs the rest of the chain.
    pub fn run(self, ctx: Arc<EventContext>) -> BoxFuture<'a, DispatchResult<bool>> {
        match self.middlewares.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    middlewares: rest,
                    endpoint: self.endpoint,
                };
                middleware.handle(ctx, next)
            }
            None => (self.endpoint)(ctx),
        }
    }
}
