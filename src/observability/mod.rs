//! Logging initialization.
//!
//! Structured logging via `tracing`, configured from the environment:
//! `MENTOR_LOG` takes an env-filter directive (default `info`), and
//! `MENTOR_LOG_FORMAT=json` switches to JSON output for log shippers.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format string; unknown values fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Env-filter directive (e.g. `info`, `mentor=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("MENTOR_LOG") {
            config.level = level;
        }
        if let Ok(format) = std::env::var("MENTOR_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        config
    }

    /// Raises the level to `debug` unless a filter was set explicitly.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose && std::env::var("MENTOR_LOG").is_err() {
            self.level = "debug".to_string();
        }
        self
    }
}

/// Initializes the global subscriber once; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    LOGGING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_new(&config.level)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        // try_init: a subscriber installed by a test harness wins.
        let result = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.compact().try_init(),
        };
        if let Err(err) = result {
            tracing::debug!("logging already initialized: {err}");
        }
    });
}
