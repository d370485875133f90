//! Tracing setup.
//!
//! One fmt layer over a [`Registry`], shaped by [`LoggingConfig`] or by
//! hand through [`LoggingBuilder`]. `RUST_LOG` always wins over the
//! configured base level, so a deployment can be made chatty without
//! touching its config file.
//!
//! ```rust,ignore
//! // From configuration:
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! // By hand, e.g. in a demo binary:
//! LoggingBuilder::new()
//!     .with_level(Level::DEBUG)
//!     .directive("colloquy_fsm=trace")
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

/// Which moments of a span's life are written out.
///
/// Mostly useful for watching dispatch spans open and close around the
/// middleware chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

impl SpanEvents {
    /// Spans stay silent.
    pub const NONE: Self = Self::of(false, false, false, false);
    /// Creation and close only; one line in, one line out.
    pub const LIFECYCLE: Self = Self::of(true, false, false, true);
    /// Every transition, including each enter/exit across awaits.
    pub const FULL: Self = Self::of(true, true, true, true);
    /// Enter and exit only.
    pub const ACTIVE: Self = Self::of(false, true, true, false);

    const fn of(new: bool, enter: bool, exit: bool, close: bool) -> Self {
        Self {
            new,
            enter,
            exit,
            close,
        }
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self::of(config.new, config.enter, config.exit, config.close)
    }
}

impl From<SpanEvents> for FmtSpan {
    fn from(events: SpanEvents) -> Self {
        [
            (events.new, FmtSpan::NEW),
            (events.enter, FmtSpan::ENTER),
            (events.exit, FmtSpan::EXIT),
            (events.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already set, so tests and embedders
/// that install their own remain in control.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Assembles filter, format, and writer for the global subscriber.
///
/// ```rust,ignore
/// LoggingBuilder::new()
///     .with_level(Level::INFO)
///     .span_events(SpanEvents::LIFECYCLE)
///     .with_thread_ids(true)
///     .init();
/// ```
#[derive(Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            with_target: true,
            ..Default::default()
        }
    }

    /// Carries every knob of the logging section over to the builder.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let directives = config
            .filters
            .iter()
            .map(|(module, level)| format!("{module}={}", level.as_str()))
            .collect();

        Self {
            directives,
            level: Some(config.level.to_tracing_level()),
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            with_target: true,
            with_thread_ids: config.thread_ids,
            with_file: config.file_location,
            with_line_number: config.file_location,
            file_path: config.file_path.clone(),
        }
    }

    /// Base level for everything without a more specific directive.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a per-module directive such as `"colloquy_fsm=trace"`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Includes source file and line in each record.
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self.with_line_number = enabled;
        self
    }

    /// Destination for [`LogOutput::File`].
    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, failing if one is already set.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.env_filter();
        let layer = match &self.output {
            LogOutput::Stdout => self.fmt_layer(std::io::stdout),
            LogOutput::Stderr => self.fmt_layer(std::io::stderr),
            LogOutput::File => match &self.file_path {
                Some(path) => {
                    let dir = path.parent().unwrap_or_else(|| Path::new("."));
                    let name = path.file_name().unwrap_or_else(|| OsStr::new("colloquy.log"));
                    self.fmt_layer(tracing_appender::rolling::never(dir, name))
                }
                None => {
                    warn!("File output configured without a file path, writing to stdout");
                    self.fmt_layer(std::io::stdout)
                }
            },
        };

        tracing_subscriber::registry().with(layer).with(filter).try_init()
    }

    /// `RUST_LOG` if set, otherwise the configured base level, plus any
    /// per-module directives on top. Directives that do not parse are
    /// skipped.
    fn env_filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = self.level.unwrap_or(tracing::Level::INFO);
            EnvFilter::new(level.to_string().to_lowercase())
        });

        self.directives
            .iter()
            .filter_map(|directive| directive.parse().ok())
            .fold(base, |filter, directive| filter.add_directive(directive))
    }

    /// One boxed fmt layer per format so the output match stays flat.
    /// Json falls back to compact when the `json-log` feature is off;
    /// [`validate_config`](crate::validate_config) refuses that
    /// combination up front.
    fn fmt_layer<W>(&self, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = fmt::layer()
            .with_span_events(FmtSpan::from(self.span_events))
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_writer(writer);

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => base.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => base.compact().boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Full => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
