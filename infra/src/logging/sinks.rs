//! Logging configured from a list of sink definitions

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use wu_shared::config::{LogFormat, LoggingConfig};

use super::{install, BoxedSubscriber, JsonRecordFormat, LoggingError, LoggingSetup, RotatingFileWriter};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

const DEFAULT_LOG_FILE: &str = "my_log.log.jsonl";
const DEFAULT_ROTATION_BYTES: u64 = 10_000;
const DEFAULT_RETENTION: usize = 7;

/// One sink definition
///
/// ```json
/// { "sink": "log/app.jsonl", "level": "DEBUG", "serialize": true, "rotation": 10000, "retention": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    /// `stderr`, `stdout` or a file path
    pub sink: String,

    #[serde(default = "default_level")]
    pub level: String,

    /// Write one JSON object per event instead of human-readable lines
    #[serde(default)]
    pub serialize: bool,

    /// Rotate file sinks once they would exceed this many bytes
    #[serde(default)]
    pub rotation: Option<u64>,

    /// Rotated files to keep
    #[serde(default)]
    pub retention: Option<usize>,
}

fn default_level() -> String {
    String::from("DEBUG")
}

/// Where a sink writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stderr,
    Stdout,
    File(PathBuf),
}

impl SinkConfig {
    pub fn target(&self) -> SinkTarget {
        match self.sink.to_ascii_lowercase().as_str() {
            "stderr" | "sys.stderr" => SinkTarget::Stderr,
            "stdout" | "sys.stdout" => SinkTarget::Stdout,
            _ => SinkTarget::File(PathBuf::from(&self.sink)),
        }
    }

    pub fn level_filter(&self) -> Option<LevelFilter> {
        let name = match self.level.to_ascii_uppercase().as_str() {
            "WARNING" => "WARN".to_string(),
            "CRITICAL" => "ERROR".to_string(),
            "SUCCESS" => "INFO".to_string(),
            other => other.to_string(),
        };
        LevelFilter::from_str(&name).ok()
    }

    fn default_sinks(log_dir: &Path) -> Vec<SinkConfig> {
        vec![
            SinkConfig {
                sink: "stderr".into(),
                level: "INFO".into(),
                serialize: false,
                rotation: None,
                retention: None,
            },
            SinkConfig {
                sink: log_dir.join(DEFAULT_LOG_FILE).to_string_lossy().into_owned(),
                level: "DEBUG".into(),
                serialize: true,
                rotation: Some(DEFAULT_ROTATION_BYTES),
                retention: Some(DEFAULT_RETENTION),
            },
        ]
    }

    fn layer(&self) -> Result<BoxedLayer, LoggingError> {
        let level = self
            .level_filter()
            .ok_or_else(|| LoggingError::InvalidLevel(self.level.clone()))?;

        Ok(match self.target() {
            SinkTarget::Stderr => fmt_layer(std::io::stderr, self.serialize, true, level),
            SinkTarget::Stdout => fmt_layer(std::io::stdout, self.serialize, true, level),
            SinkTarget::File(path) => {
                let writer = RotatingFileWriter::open(
                    path,
                    self.rotation,
                    self.retention.unwrap_or(DEFAULT_RETENTION),
                )?;
                fmt_layer(Arc::new(writer), self.serialize, false, level)
            }
        })
    }
}

fn fmt_layer<W>(writer: W, serialize: bool, ansi: bool, level: LevelFilter) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if serialize {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .fmt_fields(JsonFields::new())
            .event_format(JsonRecordFormat::default())
            .with_filter(level)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_filter(level)
            .boxed()
    }
}

/// Installs one formatting layer per configured sink
#[derive(Debug)]
pub struct SinkLogging {
    sinks: Option<Value>,
    default_config: bool,
    log_dir: PathBuf,
    configured: AtomicBool,
}

impl SinkLogging {
    /// Use the given list of sink definitions
    pub fn new(sinks: Value) -> Self {
        Self {
            sinks: Some(sinks),
            ..Self::unconfigured()
        }
    }

    /// No sinks; setup fails unless the default configuration is enabled
    pub fn unconfigured() -> Self {
        Self {
            sinks: None,
            default_config: false,
            log_dir: PathBuf::from("log"),
            configured: AtomicBool::new(false),
        }
    }

    /// stderr at INFO plus `<log_dir>/my_log.log.jsonl` at DEBUG as JSON,
    /// rotated at 10 KB keeping 7 files
    pub fn with_default_config() -> Self {
        Self {
            default_config: true,
            ..Self::unconfigured()
        }
    }

    /// stderr at the configured level and format, plus the default JSON
    /// file sink under the configured log directory
    pub fn from_config(config: &LoggingConfig) -> Self {
        let file = config.log_dir.join(DEFAULT_LOG_FILE);
        Self::new(json!([
            {
                "sink": "stderr",
                "level": config.level,
                "serialize": config.format == LogFormat::Json,
            },
            {
                "sink": file.to_string_lossy(),
                "level": "DEBUG",
                "serialize": true,
                "rotation": DEFAULT_ROTATION_BYTES,
                "retention": DEFAULT_RETENTION,
            },
        ]))
        .log_dir(&config.log_dir)
    }

    /// Directory for the default file sink
    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    /// Validate and return the sink definitions in order
    pub fn sink_configs(&self) -> Result<Vec<SinkConfig>, LoggingError> {
        if self.default_config {
            return Ok(SinkConfig::default_sinks(&self.log_dir));
        }
        let Some(Value::Array(items)) = &self.sinks else {
            return Err(LoggingError::InvalidSinks);
        };

        items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let invalid = || LoggingError::InvalidSink {
                    index: position + 1,
                    sink: item.to_string(),
                };
                let sink: SinkConfig = serde_json::from_value(item.clone()).map_err(|_| invalid())?;
                if sink.level_filter().is_none() {
                    return Err(invalid());
                }
                Ok(sink)
            })
            .collect()
    }

    /// Build the subscriber without installing it
    pub fn build_subscriber(&self) -> Result<BoxedSubscriber, LoggingError> {
        let layers = self
            .sink_configs()?
            .iter()
            .map(SinkConfig::layer)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(Registry::default().with(layers)))
    }
}

impl LoggingSetup for SinkLogging {
    fn setup(&self) -> Result<(), LoggingError> {
        if self.is_configured() {
            return Ok(());
        }
        install(self.build_subscriber()?)?;
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }
}
