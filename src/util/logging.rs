//! Structured logging setup for data-pipeline
//!
//! Logs are written to stderr through a `tracing` subscriber so that command output
//! on stdout stays machine readable. The crate level comes from the CLI or from
//! `DATA_PIPELINE_LOG_LEVEL`; `RUST_LOG` overrides everything when set.
//!
//! # Example
//!
//! ```no_run
//! use data_pipeline::util::logging::{init_logging, LoggingConfig};
//!
//! init_logging(LoggingConfig::from_env());
//!
//! tracing::info!(dataset = "sales", rows = 42, "Dataset curated");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for this crate
    pub level: Level,

    /// Use JSON output format (for log shippers in the container runtime)
    pub use_json: bool,

    /// Include the module target (e.g., data_pipeline::checker) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `DATA_PIPELINE_LOG_LEVEL` and `DATA_PIPELINE_LOG_JSON`
    pub fn from_env() -> Self {
        let level = env::var("DATA_PIPELINE_LOG_LEVEL")
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);
        let use_json = env::var("DATA_PIPELINE_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self::with_level(level).json(use_json)
    }

    /// Replaces the level, keeping the output format
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn json(mut self, use_json: bool) -> Self {
        self.use_json = use_json;
        self
    }
}

/// Parses a log level from a string
///
/// Returns `Level::INFO` if the string is not a known level.
///
/// ```
/// use data_pipeline::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    EnvFilter::default()
        .add_directive(format!("data_pipeline={}", level).parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap())
        .add_directive("warn".parse().unwrap())
}

/// Initializes the logging system; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}
