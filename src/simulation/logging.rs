//! Logging and tracing configuration
//!
//! This module provides centralized logging configuration for the simulator.
//! Console output goes to stderr (pretty or JSON); optional file output is
//! always JSON, rolled daily.

use std::io;
use thiserror::Error;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber was already installed
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps background log writers flushing until dropped
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application
    pub level: Level,
    /// Whether console output is JSON
    pub json_format: bool,
    /// Directory for rolling JSON log files, if any
    pub log_directory: Option<String>,
    /// Log file prefix
    pub log_file_prefix: String,
    /// Whether to enable span events
    pub enable_span_events: bool,
    /// Whether to enable ansi colors in console output
    pub enable_ansi: bool,
    /// Custom environment filter
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_directory: None,
            log_file_prefix: "medguard-simulator".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Emit console output as JSON
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also write JSON logs to daily files in `directory`
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Set log file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Set custom environment filter
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive used when neither a custom filter nor `RUST_LOG` is set
    pub fn default_directive(&self) -> String {
        format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level)
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Install the global tracing subscriber
    ///
    /// The returned guard must be kept alive for file output to be flushed.
    pub fn init(self) -> Result<LoggingGuard, LoggingError> {
        let env_filter = match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter)?,
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive())),
        };

        let mut guard = LoggingGuard::default();

        let json_console = self
            .json_format
            .then(|| fmt::layer().json().with_writer(io::stderr).with_span_events(self.span_events()));
        let pretty_console = (!self.json_format).then(|| {
            fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_ansi(self.enable_ansi)
                .with_span_events(self.span_events())
        });

        let file_layer = self.log_directory.as_deref().map(|directory| {
            let (writer, worker) = non_blocking(rolling::daily(directory, &self.log_file_prefix));
            guard._guards.push(worker);
            fmt::layer().json().with_writer(writer).with_span_events(self.span_events())
        });

        Registry::default()
            .with(env_filter)
            .with(json_console)
            .with(pretty_console)
            .with(file_layer)
            .try_init()?;

        info!(level = %self.level, json = self.json_format, "Logging initialized");
        Ok(guard)
    }

    /// INFO level with span events
    pub fn verbose() -> Self {
        Self::new().with_level(Level::INFO).with_span_events()
    }

    /// DEBUG level with span events
    pub fn debugging() -> Self {
        Self::new().with_level(Level::DEBUG).with_span_events()
    }

    /// Initialize logging for tests; repeated calls are ignored
    pub fn init_test() {
        let _ = Self::new().with_level(Level::WARN).without_ansi().init();
    }
}

/// Macro for creating structured log events with simulation context
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
        );
    };
}

/// Macro for creating performance measurement spans
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!(
            $name,
            component = "performance",
        )
    };
}
