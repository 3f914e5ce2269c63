//! Logging facades
//!
//! Two interchangeable ways to install the global `tracing` subscriber:
//! - [`BuiltinLogging`]: driven by a JSON configuration file
//! - [`SinkLogging`]: driven by a list of sink definitions
//!
//! Both hand out loggers as spans carrying `service=<name>`, the same
//! context the database managers attach to their own events.

mod builtin;
mod json_format;
mod rotating;
mod sinks;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use thiserror::Error;
use tracing::Span;

use wu_shared::config::LoggingConfig;

pub use builtin::{BuiltinConfig, BuiltinLogging, DEFAULT_LOGGING_CONFIG_FILE};
pub use json_format::JsonRecordFormat;
pub use rotating::RotatingFileWriter;
pub use sinks::{SinkConfig, SinkLogging, SinkTarget};

/// Boxed subscriber produced by the facades before it is installed
pub type BoxedSubscriber = Box<dyn tracing::Subscriber + Send + Sync + 'static>;

/// Logging setup failures
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not read logging configuration {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid logging configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("log_sinks should be a valid list of sink configurations")]
    InvalidSinks,

    #[error("Invalid log sink configuration at index {index}: {sink}")]
    InvalidSink { index: usize, sink: String },

    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    #[error("could not open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("a global subscriber is already installed: {0}")]
    Install(String),
}

/// A way to configure logging once and hand out named loggers
pub trait LoggingSetup {
    /// Install the global subscriber; a no-op once this instance has done so
    fn setup(&self) -> Result<(), LoggingError>;

    /// Logger bound to `service=<name>`
    ///
    /// ```
    /// use wu_infra::logging::{LoggingSetup, SinkLogging};
    ///
    /// let logger = SinkLogging::with_default_config().get_logger("billing");
    /// let _entered = logger.enter();
    /// tracing::info!("invoice sent");
    /// ```
    fn get_logger(&self, name: &str) -> Span {
        tracing::info_span!("logger", service = %name)
    }
}

/// Pick the facade for an application's logging configuration
///
/// A configuration file selects [`BuiltinLogging`]; otherwise sinks are
/// derived from the configured level and format.
pub fn facade_for(config: &LoggingConfig) -> Box<dyn LoggingSetup + Send + Sync> {
    match &config.config_file {
        Some(path) => Box::new(BuiltinLogging::with_config_path(path)),
        None => Box::new(SinkLogging::from_config(config)),
    }
}

fn install(subscriber: BoxedSubscriber) -> Result<(), LoggingError> {
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| LoggingError::Install(err.to_string()))
}
