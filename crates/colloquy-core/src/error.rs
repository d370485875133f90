//! Error types for the Colloquy dispatch engine.

use thiserror::Error;

/// A type-erased error.
///
/// Handlers and middlewares fail with arbitrary concrete error types;
/// the dispatcher carries them through the chain behind this alias.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
///
/// The two variants record *where* in the chain the failure happened;
/// the original error is preserved as the source.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler returned an error.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A middleware failed before or after running the chain.
    #[error("middleware failed: {0}")]
    Middleware(#[source] BoxError),
}

impl DispatchError {
    /// Wraps an error as a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Wraps an error as a middleware failure.
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Self::Middleware(err.into())
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that can occur while extracting handler parameters from the
/// dispatch context.
///
/// Extraction failure is not a dispatch failure: the handler whose
/// parameters could not be produced is skipped and the chain continues.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// No value of the requested type is present in the context.
    #[error("no value of type '{0}' in the dispatch context")]
    Missing(&'static str),

    /// Free-form failure raised by a [`FromContext`](crate::FromContext) impl.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a missing-value error for the given type.
    pub fn missing<T: ?Sized>() -> Self {
        Self::Missing(std::any::type_name::<T>())
    }

    /// Wraps an arbitrary message as an extraction failure.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result of a [`FromContext`](crate::FromContext) extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
