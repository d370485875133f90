//! Colloquy Runtime - Configuration and assembly layer for the Colloquy bot
//! framework.
//!
//! Everything between "a config file exists" and "a dispatcher is running"
//! lives here:
//! - Layered configuration loading (`ConfigLoader`, files + environment)
//! - Configuration validation (`validate_config`)
//! - FSM middleware assembly from configuration (`build_fsm_middleware`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//!
//! # Configuration-Driven Setup
//!
//! ```ignore
//! use colloquy_runtime::config::{load_config, validate_config};
//! use colloquy_runtime::{build_fsm_middleware, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load colloquy.toml / environment overrides
//!     let config = load_config()?;
//!     validate_config(&config)?;
//!     logging::init_from_config(&config.logging);
//!
//!     // Open the configured storage backend and wire up isolation
//!     let fsm = build_fsm_middleware(&config.fsm).await?;
//!
//!     let dispatcher = Dispatcher::new().with_middleware(fsm);
//!     // ... register matchers and run
//!     Ok(())
//! }
//! ```
//!
//! # Configuration Sources
//!
//! Configuration is merged from lowest to highest precedence:
//! 1. Compiled-in defaults
//! 2. User config directory (`~/.config/colloquy/`)
//! 3. Project config files (`colloquy.toml`, profile variants)
//! 4. Environment variables (`COLLOQUY_` prefix, `__` separators)
//! 5. Overrides passed to [`ConfigLoader::merge`]

pub mod builder;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use builder::build_fsm_middleware;
pub use config::{
    ColloquyConfig, ConfigError, ConfigLoader, ConfigResult, FsmConfig, IsolationMode,
    LoggingConfig, load_config, validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Downstream crates log through the same tracing instance.
pub use tracing;
pub use tracing_subscriber;

/// One-line import for code that only wants to log.
///
/// Brings in the `tracing` macros (`trace!` through `error!`), `span`,
/// `event`, the `instrument` attribute, and `Level`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
