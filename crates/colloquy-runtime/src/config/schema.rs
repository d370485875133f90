//! The shape of `colloquy.toml`, as serde types.

use std::collections::HashMap;
use std::path::PathBuf;

use colloquy_fsm::FsmStrategy;
use serde::{Deserialize, Serialize};

/// Top of the configuration tree; one field per subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColloquyConfig {
    /// Conversation-state settings.
    #[serde(default)]
    pub fsm: FsmConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conversation-state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsmConfig {
    /// Storage connection string (`memory://`, `redis://…`,
    /// `mongodb://…`). The scheme picks the backend.
    #[serde(default = "default_storage_url")]
    pub storage: String,

    /// How an event's origin collapses to a storage key.
    #[serde(default)]
    pub strategy: FsmStrategy,

    /// How events for one context are serialized.
    #[serde(default)]
    pub isolation: IsolationMode,
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            storage: default_storage_url(),
            strategy: FsmStrategy::default(),
            isolation: IsolationMode::default(),
        }
    }
}

fn default_storage_url() -> String {
    "memory://".to_string()
}

/// Event isolation selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// One async mutex per context inside this process (default).
    #[default]
    InProcess,

    /// No serialization; events for one context may interleave.
    Disabled,

    /// Distributed locks on the storage's Redis server. Requires a
    /// `redis://` storage and the `redis-storage` feature.
    Redis,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Span lifecycle events to emit.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Log file path; required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `colloquy_fsm = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Single-line, abbreviated (default).
    #[default]
    Compact,

    /// Single-line with full metadata.
    Full,

    /// Multi-line, human-oriented.
    Pretty,

    /// Newline-delimited JSON. Requires the `json-log` feature.
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogOutput {
    /// Standard output (default).
    #[default]
    Stdout,

    /// Standard error.
    Stderr,

    /// The file named by `file_path`.
    File,
}

/// Which span lifecycle moments produce a log line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SpanEventConfig {
    /// Span creation.
    #[serde(default)]
    pub new: bool,

    /// Entering a span.
    #[serde(default)]
    pub enter: bool,

    /// Leaving a span.
    #[serde(default)]
    pub exit: bool,

    /// A span closing for good.
    #[serde(default)]
    pub close: bool,
}
