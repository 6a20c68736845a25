//! Logging and tracing setup for the `ztable` binary
//!
//! Pretty console output goes to stderr so stdout stays clean for the JSON the binary prints.
//! JSON logs are written to a daily rotated file for bug reports. `RUST_LOG` overrides the
//! configured filter.

use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "ztable.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files should be written
    pub log_dir: PathBuf,

    /// Whether to write JSON logs to a rotated file
    pub enable_json_logs: bool,

    /// Whether to enable pretty console output (stderr)
    pub enable_console_logs: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close events
    pub enable_spans: bool,

    /// Default filter when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            include_location: cfg!(debug_assertions),
            enable_spans: cfg!(debug_assertions),
            default_filter: "info,ztable_app=debug,ztable_services=debug,ztable_persistence=debug,ztable_server=debug".to_string(),
        }
    }
}

impl LoggingConfig {
    /// JSON logs only; the console stays quiet
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: false,
            include_location: false,
            enable_spans: false,
            default_filter: "warn,ztable_app=info,ztable_services=info,ztable_server=info"
                .to_string(),
        }
    }

    /// Verbose console output plus JSON logs
    pub fn development() -> Self {
        Self::default()
    }

    /// Console only, no files
    pub fn testing() -> Self {
        Self {
            log_dir: std::env::temp_dir().join("ztable-tests"),
            enable_json_logs: false,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "debug".to_string(),
        }
    }
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // NEW fires once per span; ENTER would repeat on every poll of an awaited future.
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_ansi(true)
            .pretty()
            .with_filter(env_filter.clone())
            .boxed();

        layers.push(console_layer);
    }

    if config.enable_json_logs {
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop and has to live as long as the process.
        std::mem::forget(guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        console_enabled = config.enable_console_logs,
        "logging initialized"
    );

    Ok(())
}

/// `<local data dir>/ztable/logs`
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ztable")
        .join("logs")
}
