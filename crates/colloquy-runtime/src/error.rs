//! Error types for the Colloquy runtime.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling a runtime from configuration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The configured storage backend could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] colloquy_fsm::StorageError),

    /// The configuration asks for something this build cannot provide.
    #[error("Unsupported configuration: {0}")]
    Unsupported(&'static str),
}

/// Result of runtime assembly.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
