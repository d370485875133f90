//! # Colloquy FSM
//!
//! Conversation state for the Colloquy bot framework.
//!
//! A bot that asks a question must remember, when the next message
//! arrives, that it asked. This crate pins that memory to a
//! [`StorageKey`] (bot, chat, user, thread, destiny) and moves it
//! through four pieces:
//!
//! - [`State`] and [`StatesGroup`] declare the steps of a flow and
//!   their canonical `"group:name"` string forms
//! - [`storage`] persists each context's state and data mapping
//!   (in-memory, Redis, or MongoDB)
//! - [`FsmMiddleware`] resolves every event to its context, locks it
//!   through an [`isolation`], and injects an [`FsmContext`]
//! - [`StateFilter`] gates matchers on the current state
//!
//! ## Example
//!
//! ```rust,ignore
//! use colloquy_core::{Dispatcher, Matcher};
//! use colloquy_fsm::{FsmContext, FsmMiddleware, MatcherExt, MemoryStorage, states_group};
//! use std::sync::Arc;
//!
//! states_group! {
//!     pub group Registration {
//!         waiting_name,
//!         waiting_age,
//!     }
//! }
//!
//! async fn got_name(fsm: FsmContext) -> anyhow::Result<()> {
//!     fsm.set_state(Registration::waiting_age()).await?;
//!     Ok(())
//! }
//!
//! let dispatcher = Dispatcher::new()
//!     .with_middleware(FsmMiddleware::new(Arc::new(MemoryStorage::default())))
//!     .with(
//!         Matcher::new()
//!             .name("registration_name")
//!             .state(Registration::waiting_name())
//!             .handler(got_name),
//!     );
//! ```

pub mod isolation;
pub mod storage;

mod context;
mod error;
mod filter;
mod group;
mod key;
mod macros;
mod middleware;
mod state;
mod strategy;

pub use context::{FsmContext, IntoStateValue, RawState};
pub use error::{FilterError, StorageError, StorageResult};
pub use filter::{MatcherExt, StateFilter, StatePattern};
pub use group::{GroupBuilder, StatesGroup};
pub use key::{DEFAULT_DESTINY, StorageKey};
pub use middleware::FsmMiddleware;
pub use state::State;
pub use strategy::FsmStrategy;

// Re-export the pieces most setups touch directly.
pub use isolation::{DisabledIsolation, EventIsolation, InMemoryIsolation, IsolationGuard};
pub use storage::{
    DefaultKeyBuilder, KeyBuilder, KeyPart, MemoryStorage, StateData, Storage, StorageRegistry,
    to_state_data,
};

#[cfg(feature = "redis-storage")]
pub use isolation::RedisEventIsolation;
#[cfg(feature = "mongo-storage")]
pub use storage::MongoStorage;
#[cfg(feature = "redis-storage")]
pub use storage::RedisStorage;
