//! Logging infrastructure - structured tracing for the bridge
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level, overridable through `RUST_LOG`
//! - Zero-cost when disabled
//! - Optional span events for per-dispatch spans
//! - Console (stderr) or file output, compact or JSON

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Background file writer; dropping the guard drains its queue
static FILE_GUARD: Mutex<Option<WorkerGuard>> = parking_lot::const_mutex(None);

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path, console when `None`
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // VABRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Some(level_str) = lookup("VABRIDGE_LOG_LEVEL") {
            config.level = match level_str.to_lowercase().as_str() {
                "trace" => Level::TRACE,
                "debug" => Level::DEBUG,
                "info" => Level::INFO,
                "warn" => Level::WARN,
                "error" => Level::ERROR,
                _ => Level::INFO,
            };
        }

        config.log_path = lookup("VABRIDGE_LOG_FILE");
        config.json_format = lookup("VABRIDGE_LOG_JSON").is_some();
        config.show_spans = lookup("VABRIDGE_LOG_SPANS").is_some();

        config
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Initialize logging with default configuration
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls are no-ops, as is
/// a call made after another global subscriber was set.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("vabridge={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let to_file = config.log_path.is_some();
        let writer = match config.log_path.as_deref() {
            Some(path) => file_writer(Path::new(path)),
            None => BoxMakeWriter::new(io::stderr),
        };

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(!to_file)
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions));

        let layer = if config.json_format {
            layer.json().boxed()
        } else {
            layer.compact().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok(); // Ignore error if another subscriber is installed
    });
}

fn file_writer(path: &Path) -> BoxMakeWriter {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "vabridge.log".into(), |name| name.to_os_string());

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    *FILE_GUARD.lock() = Some(guard);
    BoxMakeWriter::new(writer)
}

/// Write out queued file output before the process exits
///
/// Statics are not dropped by `std::process::exit`, so callers that exit
/// must flush first. Events logged to a file afterwards are discarded.
pub fn flush() {
    drop(FILE_GUARD.lock().take());
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Log a format string that implies too many arguments
pub fn log_overflow(limit: usize, terminating: bool) {
    tracing::error!(
        event = "format_overflow",
        limit,
        terminating,
        "format string exceeds argument limit"
    );
}

/// Log a message whose selector the host does not know
pub fn log_unknown_selector(id: u64) {
    tracing::error!(
        event = "unknown_selector",
        selector = id,
        "unexpected call selector"
    );
}

/// Log a call the host could not complete
pub fn log_dispatch_error(selector: &str, error: &dyn std::error::Error) {
    tracing::error!(
        event = "dispatch_error",
        selector,
        error = %error,
        "call dispatch failed"
    );
}
