//! Logging configured from a JSON file

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use wu_shared::config::LogFormat;

use super::{install, BoxedSubscriber, JsonRecordFormat, LoggingError, LoggingSetup};

/// File read when no explicit path is requested
pub const DEFAULT_LOGGING_CONFIG_FILE: &str = "logger.config.json";

/// Contents of the logging configuration file
///
/// ```json
/// { "level": "info", "format": "json", "fields": { "lvl": "level", "logger": "target" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinConfig {
    /// Filter directive, e.g. `info` or `wu_api=debug,info`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Output key -> record attribute, used by the `json` format
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_level() -> String {
    String::from("info")
}

fn default_format() -> LogFormat {
    LogFormat::Json
}

/// Installs a subscriber described by a JSON configuration file
#[derive(Debug, Default)]
pub struct BuiltinLogging {
    config_path: Option<PathBuf>,
    configured: AtomicBool,
}

impl BuiltinLogging {
    /// Use `logger.config.json` in the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration file instead of the default one
    pub fn with_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            configured: AtomicBool::new(false),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGGING_CONFIG_FILE))
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    pub fn load_config(&self) -> Result<BuiltinConfig, LoggingError> {
        read_config(&self.config_path())
    }

    /// Build the subscriber without installing it
    pub fn build_subscriber(&self) -> Result<BoxedSubscriber, LoggingError> {
        build_with_writer(&self.load_config()?, std::io::stderr)
    }
}

impl LoggingSetup for BuiltinLogging {
    fn setup(&self) -> Result<(), LoggingError> {
        if self.is_configured() {
            return Ok(());
        }
        install(self.build_subscriber()?)?;
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<BuiltinConfig, LoggingError> {
    let raw = fs::read_to_string(path).map_err(|source| LoggingError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Build a subscriber for `config` writing to `writer`
pub(crate) fn build_with_writer<W>(config: &BuiltinConfig, writer: W) -> Result<BoxedSubscriber, LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|_| LoggingError::InvalidLevel(config.level.clone()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let subscriber: BoxedSubscriber = match config.format {
        LogFormat::Json => Box::new(
            builder
                .fmt_fields(JsonFields::new())
                .event_format(JsonRecordFormat::new(config.fields.clone()))
                .finish(),
        ),
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    Ok(subscriber)
}
