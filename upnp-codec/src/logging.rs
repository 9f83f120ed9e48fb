//! Logging setup for hosts of the codec stack
//!
//! The codecs log through `tracing`: repairs of malformed bodies at `warn`
//! under the `upnp_codec::recovery` and `upnp_xml::repair` targets, the
//! outcome of each recovery pass at `info`, per-argument reads at `debug`.
//! Hosts that do not install their own subscriber can use [`init_logging`]
//! to get one.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable selecting the logging mode
pub const LOG_MODE_ENV: &str = "UPNP_LOG_MODE";
/// Environment variable overriding the log filter
pub const LOG_LEVEL_ENV: &str = "UPNP_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose output with source locations
    Debug,
}

impl LoggingMode {
    /// Mode named by `value`, defaulting to `Silent` for anything unknown
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("development") => LoggingMode::Development,
            Some("debug") => LoggingMode::Debug,
            _ => LoggingMode::Silent,
        }
    }

    /// Filter used when neither `UPNP_LOG_LEVEL` nor `RUST_LOG` is set
    pub fn default_directives(self) -> Option<&'static str> {
        match self {
            LoggingMode::Silent => None,
            LoggingMode::Development => {
                Some("warn,upnp_codec::recovery=info,upnp_xml::repair=info")
            }
            LoggingMode::Debug => Some("info,upnp_codec=debug,upnp_xml=debug,upnp_model=debug"),
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// # Examples
///
/// ```rust,ignore
/// upnp_codec::logging::init_logging(LoggingMode::Development)?;
/// ```
///
/// # Environment Variables
///
/// - `UPNP_LOG_LEVEL`: filter directives (e.g. `upnp_codec=debug`), takes
///   precedence over `RUST_LOG`
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let Some(default_directives) = mode.default_directives() else {
        return Ok(());
    };
    let filter = create_env_filter(default_directives)?;

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from the `UPNP_LOG_MODE` environment variable
///
/// - "development" -> LoggingMode::Development
/// - "debug" -> LoggingMode::Debug
/// - anything else -> LoggingMode::Silent
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = LoggingMode::from_env_value(std::env::var(LOG_MODE_ENV).ok().as_deref());
    init_logging(mode)
}

fn create_env_filter(default_directives: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_directives.to_string());
    parse_directives(&directives)
}

fn parse_directives(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives)
        .map_err(|e| LoggingError::InvalidEnv(format!("{}: {}", directives, e)))
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
