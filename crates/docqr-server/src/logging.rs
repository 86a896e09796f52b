//! Logging and tracing setup for the `docqr` binary
//!
//! Console output is pretty text for people or JSON for log shippers.
//! Optionally a daily rolling JSON file is written next to it. `RUST_LOG`
//! always takes precedence over the configured filter.

use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ServerConfig;

const DEFAULT_FILTER: &str = "info,docqr=debug,docqr_core=debug,docqr_connection=debug,docqr_drivers=debug,docqr_services=debug,docqr_server=debug,tower_http=info";

const LOG_FILE_NAME: &str = "docqr.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files; `None` disables them
    pub log_dir: Option<PathBuf>,

    /// Print JSON lines on the console instead of pretty text
    pub json_console: bool,

    pub enable_console_logs: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close (for performance tracing)
    pub enable_spans: bool,

    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            json_console: false,
            enable_console_logs: true,
            include_location: cfg!(debug_assertions),
            enable_spans: false,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// JSON console output and a rolling file in the default log directory
    pub fn production() -> Self {
        Self {
            log_dir: Some(log_directory()),
            json_console: true,
            enable_console_logs: true,
            include_location: false,
            enable_spans: false,
            default_filter: "info,tower_http=warn".to_string(),
        }
    }

    /// Pretty console output, verbose
    pub fn development() -> Self {
        Self {
            enable_spans: true,
            ..Self::default()
        }
    }

    /// Build the configuration for a server run
    pub fn from_server_config(config: &ServerConfig) -> Self {
        let mut logging = if config.log_json {
            Self::production()
        } else {
            Self::development()
        };
        if let Some(dir) = &config.log_dir {
            logging.log_dir = Some(dir.clone());
        }
        if let Some(filter) = &config.log_filter {
            logging.default_filter = filter.clone();
        }
        logging
    }
}

/// Initialize the global subscriber.
///
/// Fails if a subscriber is already installed or the log directory cannot
/// be created.
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // NEW fires once per span; ENTER would fire on every re-poll of an awaited future.
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    if config.enable_console_logs {
        let console_layer = if config.json_console {
            fmt::layer()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_span_events(span_events.clone())
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_filter(env_filter.clone())
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_span_events(span_events.clone())
                .with_ansi(true)
                .pretty()
                .with_filter(env_filter.clone())
                .boxed()
        };

        layers.push(console_layer);
    }

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop and must live until the process exits.
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

    tracing::info!(
        log_dir = ?config.log_dir,
        json_console = config.json_console,
        "logging initialized"
    );

    Ok(())
}

/// Default directory for log files
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docqr")
        .join("logs")
}
