//! Handler system for the Colloquy framework.
//!
//! Handlers are plain async functions whose parameters implement
//! [`FromContext`](crate::extract::FromContext). A blanket macro
//! implements [`Handler`] for functions of zero to sixteen such
//! parameters, so registration is just passing the function:
//!
//! ```rust,ignore
//! async fn on_message(event: BoxedEvent, fsm: FsmContext) -> anyhow::Result<()> {
//!     // ...
//!     Ok(())
//! }
//!
//! matcher.handler(on_message);
//! ```
//!
//! # Design
//!
//! - Extraction failure skips the handler (logged at `trace`), it never
//!   fails the dispatch. A handler that wants to observe a missing value
//!   takes `Option<T>` instead.
//! - Handler return values fold into the dispatch result through
//!   [`HandleResponse`]: `()` always succeeds, `Result<(), E>` errors
//!   propagate out of `dispatch` as handler failures.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::context::EventContext;
use crate::error::BoxError;
use crate::extract::FromContext;

// ============================================================================
// Handler Response
// ============================================================================

/// Trait for types handlers may return.
pub trait HandleResponse: Send {
    /// Folds the return value into the dispatch result.
    fn into_result(self) -> Result<(), BoxError>;
}

impl HandleResponse for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// `Result` returns propagate their error out of the dispatch chain.
impl<E> HandleResponse for Result<(), E>
where
    E: Into<BoxError> + Send,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// The Handler trait
// ============================================================================

/// A callable event handler.
///
/// Implemented automatically for async functions and closures whose
/// parameters implement `FromContext`; the type parameter `T` is the
/// tuple of extracted parameter types.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Extracts parameters from the context and invokes the function.
    async fn call(self, ctx: Arc<EventContext>) -> Result<(), BoxError>;
}

// ============================================================================
// Blanket Implementations
// ============================================================================

macro_rules! impl_handler {
    ( $($ty:ident),* ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandleResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<EventContext>) -> Result<(), BoxError> {
                $(
                    let Ok($ty) = $ty::from_context(&ctx) else {
                        trace!(
                            param = std::any::type_name::<$ty>(),
                            "Parameter extraction failed, skipping handler"
                        );
                        return Ok(());
                    };
                )*
                self($($ty,)*).await.into_result()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16);

// ============================================================================
// Type-Erased Handlers
// ============================================================================

/// A type-erased handler, ready to be stored in collections.
#[derive(Clone)]
pub struct BoxedHandler {
    f: Arc<dyn Fn(Arc<EventContext>) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>,
}

impl BoxedHandler {
    /// Erases a typed handler.
    pub fn new<F, T>(handler: F) -> Self
    where
        F: Handler<T>,
        T: 'static,
    {
        Self {
            f: Arc::new(move |ctx| handler.clone().call(ctx)),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, ctx: Arc<EventContext>) -> BoxFuture<'static, Result<(), BoxError>> {
        (*self.f)(ctx)
    }
}

impl std::fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxedHandler")
    }
}

/// Erases a typed handler into a [`BoxedHandler`].
pub fn into_handler<F, T>(handler: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    BoxedHandler::new(handler)
}
