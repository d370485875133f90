//! # Colloquy Core
//!
//! Event dispatch engine for the Colloquy bot framework.
//!
//! What lives here:
//! - Event and bot abstractions that adapters implement per platform
//! - Matchers, which pair a set of checks with the handler they guard
//! - The [`Handler`] trait, so plain async functions become handlers with
//!   their parameters extracted from the [`EventContext`]
//! - A middleware chain bracketing the whole matcher loop
//!
//! Everything stateful about a *conversation* lives one layer up, in
//! `colloquy-fsm`; this crate only moves events from the edge to the
//! handlers that asked for them.

pub mod bot;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod extract;
pub mod handler;
pub mod matcher;
pub mod middleware;

pub use bot::{Bot, BoxedBot};
pub use context::EventContext;
pub use dispatcher::Dispatcher;
pub use error::{BoxError, DispatchError, DispatchResult, ExtractError, ExtractResult};
pub use event::{BoxedEvent, Event, EventOrigin, EventType};
pub use extract::FromContext;
pub use handler::{BoxedHandler, HandleResponse, Handler, into_handler};
pub use matcher::{CheckFn, Matcher, on_event_type, on_message};
pub use middleware::{Middleware, Next};
