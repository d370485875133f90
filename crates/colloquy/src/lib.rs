//! # Colloquy
//!
//! A type-safe, storage-agnostic conversation framework for chat bots in Rust.
//!
//! ## Overview
//!
//! Colloquy is built around one observation: a bot that asks a question must
//! remember, when the next message arrives, that it asked. The framework pins
//! that memory to a per-conversation key and routes every event through it,
//! so handlers read like steps of a dialogue instead of a pile of `match`
//! arms over global maps.
//!
//! ## Architecture
//!
//! Events flow through a middleware-bracketed matcher loop:
//!
//! ```text
//! ┌─────────┐     ┌───────────────────┐     ┌──────────────────────────────┐
//! │ Adapter │────▶│  FsmMiddleware    │────▶│ Matcher "ask_name"  (state)  │──▶ handler
//! │ (event) │     │ key → lock → ctx  │────▶│ Matcher "ask_age"   (state)  │──▶ handler
//! └─────────┘     └───────────────────┘────▶│ Matcher ...                  │──▶ handler
//!                                           └──────────────────────────────┘
//! ```
//!
//! - **Core**: Event, bot, and matcher abstractions; the dispatch loop
//! - **FSM**: Conversation keys, states, storage backends, per-key locking
//! - **Runtime**: Configuration files, validation, logging, assembly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use colloquy::prelude::*;
//! use std::sync::Arc;
//!
//! states_group! {
//!     pub group Registration {
//!         waiting_name,
//!         waiting_age,
//!     }
//! }
//!
//! async fn start(fsm: FsmContext) -> anyhow::Result<()> {
//!     fsm.set_state(Registration::waiting_name()).await?;
//!     Ok(())
//! }
//!
//! async fn got_name(fsm: FsmContext, event: BoxedEvent) -> anyhow::Result<()> {
//!     fsm.update_data([("name".to_string(), event.as_text().into())]).await?;
//!     fsm.set_state(Registration::waiting_age()).await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let dispatcher = Dispatcher::new()
//!         .with_middleware(build_fsm_middleware(&config.fsm).await?)
//!         .with(Matcher::new().name("start").state_absent().handler(start))
//!         .with(
//!             Matcher::new()
//!                 .name("name")
//!                 .state(Registration::waiting_name())
//!                 .handler(got_name),
//!         );
//!     // ... feed adapter events into dispatcher.dispatch(...)
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `redis-storage`: Redis storage backend and Redis-backed isolation
//! - `mongo-storage`: MongoDB storage backend

pub use colloquy_core as core;
pub use colloquy_fsm as fsm;
pub use colloquy_runtime as runtime;

/// Single-import surface for bot binaries.
///
/// Pulls in everything a typical handler module touches:
///
/// ```rust,ignore
/// use colloquy::prelude::*;
/// ```
pub mod prelude {
    // Dispatch loop
    pub use colloquy_core::{Dispatcher, Matcher, on_event_type, on_message};

    // Events and the context handlers receive them in
    pub use colloquy_core::{
        Bot, BoxedBot, BoxedEvent, Event, EventContext, EventOrigin, EventType,
    };

    // Custom handler-parameter extraction
    pub use colloquy_core::FromContext;

    // Conversation state - context, middleware, and matcher gating
    pub use colloquy_fsm::{
        FsmContext, FsmMiddleware, FsmStrategy, MatcherExt, RawState, State, StateFilter,
        StatesGroup, StorageKey,
    };

    // State declarations
    pub use colloquy_fsm::states_group;

    // Storage - the pieces most setups touch directly
    pub use colloquy_fsm::{MemoryStorage, Storage, StorageRegistry};

    // Runtime - configuration and assembly
    pub use colloquy_runtime::{build_fsm_middleware, load_config, validate_config};
}
