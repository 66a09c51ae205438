//! Logging for the `graphpool` binary
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! Each command also writes JSON lines to `<log_dir>/<command>.<date>.log`,
//! rotated daily with the newest seven files kept.
//!
//! `RUST_LOG` takes precedence. Without it the level comes from `LOG_LEVEL`
//! (`DEBUG`, `INFO`, `WARNING`, `ERROR` or `CRITICAL`), defaulting to `INFO`.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rotated log files kept per command
pub const MAX_LOG_FILES: usize = 7;

const CRATES: &[&str] = &[
    "graphpool",
    "graphpool_core",
    "graphpool_connection",
    "graphpool_driver_neo4j",
    "graphpool_services",
];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files are written
    pub log_dir: PathBuf,

    /// Log file name prefix, the command being run
    pub file_prefix: String,

    pub enable_file_logs: bool,

    pub enable_console_logs: bool,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn for_command(command: &str) -> Self {
        let level = log_level(std::env::var("LOG_LEVEL").ok().as_deref());
        Self {
            log_dir: PathBuf::from("logs"),
            file_prefix: command.to_string(),
            enable_file_logs: true,
            enable_console_logs: true,
            default_filter: default_filter(level),
        }
    }
}

/// Map a `LOG_LEVEL` value onto a tracing level directive
pub fn log_level(value: Option<&str>) -> &'static str {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => "trace",
        Some("DEBUG") => "debug",
        Some("WARNING") | Some("WARN") => "warn",
        // tracing has nothing above error
        Some("ERROR") | Some("CRITICAL") => "error",
        _ => "info",
    }
}

fn default_filter(level: &str) -> String {
    let mut filter = String::from("warn");
    for krate in CRATES {
        filter.push_str(&format!(",{}={}", krate, level));
    }
    filter
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the program exits.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter))
    };

    let mut layers = Vec::new();
    let mut guard = None;

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed();

        layers.push(console_layer);
    }

    if config.enable_file_logs {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("failed to create log directory {}", config.log_dir.display())
        })?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(config.file_prefix.as_str())
            .filename_suffix("log")
            .max_log_files(MAX_LOG_FILES)
            .build(&config.log_dir)
            .context("failed to open log file")?;
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(filter())
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("logging already initialized")?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        file = config.enable_file_logs,
        "logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn log_level_names_map_onto_tracing_levels() {
        assert_eq!(log_level(Some("DEBUG")), "debug");
        assert_eq!(log_level(Some("info")), "info");
        assert_eq!(log_level(Some("WARNING")), "warn");
        assert_eq!(log_level(Some("ERROR")), "error");
        assert_eq!(log_level(Some("CRITICAL")), "error");
    }

    #[test]
    fn unknown_or_missing_level_falls_back_to_info() {
        assert_eq!(log_level(None), "info");
        assert_eq!(log_level(Some("")), "info");
        assert_eq!(log_level(Some("verbose")), "info");
    }

    #[test]
    fn default_filter_quiets_dependencies() {
        let filter = default_filter("debug");

        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("graphpool_connection=debug"));
        assert!(filter.contains("graphpool_driver_neo4j=debug"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }
}
