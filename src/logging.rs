//! Structured logging and tracing for Helios
//!
//! Console output goes to stderr so stdout carries only the report (text or
//! JSON) for whatever invoked the timer. An optional daily-rolling file layer
//! keeps a history of runs.

use crate::config::LoggingConfig;
use crate::error::{HeliosError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;

pub use level::{min_level, parse_log_level};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration.
///
/// `verbose` lowers the console level to DEBUG regardless of the configured
/// level. Safe to call more than once; only the first call takes effect.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;
            let console_level = if verbose {
                min_level(base_level, Level::DEBUG)
            } else {
                base_level
            };
            let filter = build_env_filter(min_level(console_level, base_level));

            let file = if should_use_console_only() {
                None
            } else {
                config.file.as_deref()
            };

            let file_layer = match file {
                Some(file) => {
                    let appender = rolling::Builder::new()
                        .rotation(rolling::Rotation::DAILY)
                        .filename_prefix("helios")
                        .filename_suffix("log")
                        .max_log_files(config.backup_count.max(1) as usize)
                        .build(log_dir(file))
                        .map_err(|e| {
                            HeliosError::io(format!("Failed to create log file appender: {}", e))
                        })?;
                    let (writer, guard) = non_blocking(appender);
                    let _ = LOG_GUARD.set(guard);
                    let base = fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false);
                    Some(if config.json_format {
                        base.json()
                            .with_filter(LevelFilter::from_level(base_level))
                            .boxed()
                    } else {
                        base.with_filter(LevelFilter::from_level(base_level))
                            .boxed()
                    })
                }
                None => None,
            };

            let console_layer = config.console_output.then(|| {
                let base = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false);
                if config.json_format {
                    base.json()
                        .with_filter(LevelFilter::from_level(console_level))
                        .boxed()
                } else {
                    base.with_filter(LevelFilter::from_level(console_level))
                        .boxed()
                }
            });

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(console_layer)
                .try_init()
                .map_err(|e| HeliosError::config(format!("Logging already initialized: {}", e)))?;

            debug!(
                "Logging initialized - console_level: {:?}, file: {}",
                console_level,
                file.unwrap_or("none")
            );
            Ok(())
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(HeliosError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("helios={},reqwest=warn,hyper=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("HELIOS_DISABLE_FILE_LOG").is_some()
}

// A path with an extension names a file; its directory holds the rotated logs.
fn log_dir(file: &str) -> &Path {
    let p = Path::new(file);
    if p.extension().is_some() {
        p.parent().unwrap_or(p)
    } else {
        p
    }
}

/// Context information for log messages
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "reading", "inverter", "pvoutput")
    pub component: String,

    /// ECU host the run is reading from
    pub host: Option<String>,

    /// Additional context fields
    pub extra_fields: std::collections::BTreeMap<String, String>,
}

impl LogContext {
    /// Create a new log context
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            host: None,
            extra_fields: std::collections::BTreeMap::new(),
        }
    }

    /// Set ECU host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Add extra field
    pub fn with_field(mut self, key: &str, value: String) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }
}

/// Structured logger with context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
}

impl StructuredLogger {
    /// Create a new structured logger with context
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn info(&self, message: &str) {
        let fields = self.format_fields();
        info!(%fields, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        let fields = self.format_fields();
        warn!(%fields, "{}", message);
    }

    pub fn error(&self, message: &str) {
        let fields = self.format_fields();
        error!(%fields, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        let fields = self.format_fields();
        debug!(%fields, "{}", message);
    }

    pub fn trace(&self, message: &str) {
        let fields = self.format_fields();
        trace!(%fields, "{}", message);
    }

    /// Format context fields for logging
    fn format_fields(&self) -> String {
        let mut fields = vec![format!("component={}", self.context.component)];

        if let Some(ref host) = self.context.host {
            fields.push(format!("host={}", host));
        }

        for (key, value) in &self.context.extra_fields {
            fields.push(format!("{}={}", key, value));
        }

        fields.join(",")
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

/// Create a logger with full context
pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}
