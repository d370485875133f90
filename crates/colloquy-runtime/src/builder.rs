//! Assembles FSM dispatch pieces from configuration.
//!
//! The builder turns a validated [`FsmConfig`] into a ready-to-attach
//! [`FsmMiddleware`]: it opens the configured storage backend through the
//! scheme registry and wires up the requested isolation mode.
//!
//! # Example
//!
//! ```rust,ignore
//! use colloquy_runtime::builder::build_fsm_middleware;
//! use colloquy_runtime::config::load_config;
//!
//! let config = load_config()?;
//! let middleware = build_fsm_middleware(&config.fsm).await?;
//! let dispatcher = Dispatcher::new().with_middleware(middleware);
//! ```

use colloquy_fsm::isolation::DisabledIsolation;
use colloquy_fsm::{FsmMiddleware, StorageRegistry};
use tracing::info;

use crate::config::{FsmConfig, IsolationMode};
use crate::error::RuntimeResult;

/// Build an [`FsmMiddleware`] from configuration.
///
/// The storage URL is resolved through [`StorageRegistry::with_defaults`], so
/// the set of accepted schemes follows the enabled storage features.
pub async fn build_fsm_middleware(config: &FsmConfig) -> RuntimeResult<FsmMiddleware> {
    let storage = StorageRegistry::with_defaults().open(&config.storage).await?;
    info!(
        storage = %config.storage,
        strategy = ?config.strategy,
        isolation = ?config.isolation,
        "Building FSM middleware"
    );

    let middleware = FsmMiddleware::new(storage).with_strategy(config.strategy);
    match config.isolation {
        IsolationMode::InProcess => Ok(middleware),
        IsolationMode::Disabled => Ok(middleware.with_isolation(DisabledIsolation)),
        IsolationMode::Redis => attach_redis_isolation(middleware, &config.storage).await,
    }
}

/// Attach Redis-backed isolation, sharing the storage connection string.
#[cfg(feature = "redis-storage")]
async fn attach_redis_isolation(
    middleware: FsmMiddleware,
    url: &str,
) -> RuntimeResult<FsmMiddleware> {
    let isolation = colloquy_fsm::isolation::RedisEventIsolation::from_url(url).await?;
    Ok(middleware.with_isolation(isolation))
}

#[cfg(not(feature = "redis-storage"))]
async fn attach_redis_isolation(
    _middleware: FsmMiddleware,
    _url: &str,
) -> RuntimeResult<FsmMiddleware> {
    Err(crate::error::RuntimeError::Unsupported(
        "redis isolation requires the \"redis-storage\" feature",
    ))
}

// =============================================================================
// Tests
// =============================================================================
