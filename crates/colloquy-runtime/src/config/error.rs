//! What can go wrong between a config file and a running setup.

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loading or validation failure.
///
/// Messages carry no "configuration" prefix of their own; the caller
/// wrapping them (e.g. `RuntimeError`) adds that context.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A source could not be parsed or extracted into the schema.
    #[error("{0}")]
    ParseError(String),

    /// The parsed values do not form a usable setup.
    #[error("{message}")]
    ValidationError { message: String },

    /// A field the rest of the setup depends on is empty.
    #[error("required field {field} is not set")]
    MissingField { field: String },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
