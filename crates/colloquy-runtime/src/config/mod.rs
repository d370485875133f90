//! Configuration module for the Colloquy runtime.
//!
//! This module provides file- and environment-based configuration
//! loading and validation for conversation storage, isolation, and
//! logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ColloquyConfig, FsmConfig, IsolationMode, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
