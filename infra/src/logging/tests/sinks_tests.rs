use serde_json::json;

use crate::logging::{LoggingError, LoggingSetup, SinkConfig, SinkLogging, SinkTarget};

#[test]
fn test_default_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let sinks = SinkLogging::with_default_config()
        .log_dir(dir.path())
        .sink_configs()
        .unwrap();

    assert_eq!(sinks.len(), 2);
    assert_eq!(sinks[0].target(), SinkTarget::Stderr);
    assert_eq!(sinks[0].level, "INFO");
    assert!(!sinks[0].serialize);

    assert_eq!(sinks[1].target(), SinkTarget::File(dir.path().join("my_log.log.jsonl")));
    assert_eq!(sinks[1].level, "DEBUG");
    assert!(sinks[1].serialize);
    assert_eq!(sinks[1].rotation, Some(10_000));
    assert_eq!(sinks[1].retention, Some(7));
}

#[test]
fn test_missing_sinks_fail() {
    let err = SinkLogging::unconfigured().setup().unwrap_err();

    assert!(matches!(err, LoggingError::InvalidSinks));
    assert_eq!(
        err.to_string(),
        "log_sinks should be a valid list of sink configurations"
    );
}

#[test]
fn test_non_list_sinks_fail() {
    let err = SinkLogging::new(json!({"sink": "stderr"}))
        .sink_configs()
        .unwrap_err();

    assert!(matches!(err, LoggingError::InvalidSinks));
}

#[test]
fn test_invalid_sink_reports_position() {
    let err = SinkLogging::new(json!([
        {"sink": "stderr", "level": "INFO"},
        {"sink": "stdout", "colour": true},
    ]))
    .sink_configs()
    .unwrap_err();

    match &err {
        LoggingError::InvalidSink { index, sink } => {
            assert_eq!(*index, 2);
            assert!(sink.contains("colour"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Invalid log sink configuration at index 2:"));
}

#[test]
fn test_unknown_level_is_an_invalid_sink() {
    let err = SinkLogging::new(json!([{"sink": "stderr", "level": "LOUD"}]))
        .sink_configs()
        .unwrap_err();

    assert!(matches!(err, LoggingError::InvalidSink { index: 1, .. }));
}

#[test]
fn test_level_aliases() {
    let sink: SinkConfig =
        serde_json::from_value(json!({"sink": "stdout", "level": "WARNING"})).unwrap();

    assert_eq!(sink.target(), SinkTarget::Stdout);
    assert_eq!(
        sink.level_filter(),
        Some(tracing_subscriber::filter::LevelFilter::WARN)
    );
}

#[test]
fn test_file_sink_receives_json_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.jsonl");
    let logging = SinkLogging::new(json!([
        {"sink": path.to_str().unwrap(), "level": "DEBUG", "serialize": true}
    ]));

    let subscriber = logging.build_subscriber().unwrap();
    tracing::subscriber::with_default(subscriber, || {
        let span = logging.get_logger("worker");
        let _entered = span.enter();
        tracing::debug!("job started");
        tracing::trace!("too chatty");
    });

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "job started");
    assert_eq!(lines[0]["service"], "worker");
}

#[test]
fn test_default_config_creates_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let logging = SinkLogging::with_default_config().log_dir(dir.path().join("log"));

    logging.build_subscriber().unwrap();

    assert!(dir.path().join("log").join("my_log.log.jsonl").exists());
}

#[test]
fn test_sinks_follow_logging_config() {
    use wu_shared::config::{Environment, LoggingConfig};

    let dir = tempfile::tempdir().unwrap();
    let mut config = LoggingConfig::for_environment(Environment::Production);
    config.log_dir = dir.path().to_path_buf();

    let sinks = SinkLogging::from_config(&config).sink_configs().unwrap();

    assert_eq!(sinks[0].target(), SinkTarget::Stderr);
    assert_eq!(sinks[0].level, "warn");
    assert!(sinks[0].serialize);
    assert_eq!(sinks[1].target(), SinkTarget::File(dir.path().join("my_log.log.jsonl")));
}
