//! Logging infrastructure
//!
//! `tracing` events and spans throughout the bridge, formatted with
//! `tracing-subscriber`. The binding is usually loaded into a host process, so
//! installation never panics when a global subscriber already exists.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{LogFormatName, LoggingConfig};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with timestamps
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// File with daily rotation
    File { directory: PathBuf, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Whether to emit span open/close events
    pub span_events: bool,
    /// Extra filter directives (e.g., "ospray=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Build from the `[logging]` section of the binding config
    pub fn from_config(config: &LoggingConfig) -> Self {
        let format = match config.format {
            LogFormatName::Pretty => LogFormat::Pretty,
            LogFormatName::Compact => LogFormat::Compact,
            LogFormatName::Json => LogFormat::Json,
        };
        let output = match &config.directory {
            Some(directory) => LogOutput::File {
                directory: directory.clone(),
                prefix: "pyospray".to_string(),
            },
            None => LogOutput::Stderr,
        };

        Self {
            level: parse_level(&config.level),
            format,
            output,
            span_events: config.spans,
            filter: config.filter.clone(),
        }
    }
}

/// Parse a level name, falling back to `WARN`
pub fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

static INITIALIZED: OnceCell<()> = OnceCell::new();
static GUARD: Mutex<Option<WorkerGuard>> = parking_lot::const_mutex(None);

/// Install the global subscriber once per process.
///
/// Returns `false` if logging was already set up, by this crate or by the host.
pub fn init_logging(config: LogConfig) -> bool {
    let mut installed = false;
    INITIALIZED.get_or_init(|| {
        installed = install(config);
    });
    installed
}

fn install(config: LogConfig) -> bool {
    let filter = build_filter(&config);
    let spans = span_events_config(config.span_events);

    let (writer, guard) = match &config.output {
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(rolling::daily(directory, prefix))
        }
    };

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .pretty()
            .with_span_events(spans)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .compact()
            .with_span_events(spans)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(writer)
            .json()
            .with_span_events(spans)
            .boxed(),
    };

    match tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
    {
        Ok(()) => {
            *GUARD.lock() = Some(guard);
            true
        }
        Err(_) => false,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    match &config.filter {
        Some(filter_str) => filter_str.split(',').fold(base_filter, |filter, directive| {
            match directive.trim().parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => {
                    eprintln!("pyospray: ignoring invalid log filter directive '{}'", directive);
                    filter
                }
            }
        }),
        None => base_filter,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Flush buffered log lines and drop the writer guard
pub fn flush() {
    GUARD.lock().take();
}
