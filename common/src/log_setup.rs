//! Process-wide `tracing` subscriber setup for binaries and demos.
//!
//! Libraries in this workspace only emit events through `tracing` macros;
//! installing the subscriber is left to the executable.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set,
    /// e.g. `"info"` or `"hips=debug,info"`.
    pub base_level: String,
    /// Directory for rolling log files. `None` disables file output.
    pub log_dir: Option<PathBuf>,
    /// Log file name prefix (`<prefix>.YYYY-MM-DD.log`).
    pub file_prefix: String,
    /// Number of daily log files kept on disk.
    pub max_log_files: usize,
    /// Colored console output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: "info".to_string(),
            log_dir: Some(PathBuf::from("logs")),
            file_prefix: "hips".to_string(),
            max_log_files: 5,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Default configuration with a different base filter.
    pub fn with_level(base_level: &str) -> Self {
        Self {
            base_level: base_level.to_string(),
            ..Default::default()
        }
    }

    /// Builds the filter, preferring `RUST_LOG` over `base_level`.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.base_level))
            .unwrap_or_else(|e| panic!("Invalid log filter '{}': {}", self.base_level, e))
    }
}

/// Installs the global subscriber with the default configuration and the
/// given base filter.
pub fn setup_logging(base_level: &str) {
    setup_logging_with(&LogConfig::with_level(base_level));
}

/// Installs the global subscriber: console output (WARN and above also go to
/// stderr) plus an optional daily rotated log file.
///
/// # Panics
///
/// Panics if the filter is invalid, the log directory cannot be created, or
/// logging was already initialized.
pub fn setup_logging_with(config: &LogConfig) {
    let env_filter = config.env_filter();

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(config.ansi)
        .with_writer(console_writer);

    let file_layer = config.log_dir.as_ref().map(|dir| {
        std::fs::create_dir_all(dir).unwrap_or_else(|e| {
            panic!("Failed to create log directory '{}': {}", dir.display(), e)
        });

        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_log_files)
            .build(dir)
            .unwrap_or_else(|e| panic!("Failed to create log file appender: {}", e));

        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        LOG_GUARD.set(guard).expect("Logging already initialized");

        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_writer)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));
}
