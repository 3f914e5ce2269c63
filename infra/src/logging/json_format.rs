//! One JSON object per event
//!
//! `message` and `timestamp` (RFC 3339, UTC) are always present. An
//! optional rename map chooses output keys for record attributes, e.g.
//! `{"lvl": "level", "logger": "target"}`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Structured JSON event formatter
#[derive(Debug, Clone, Default)]
pub struct JsonRecordFormat {
    /// output key -> record attribute
    fields: BTreeMap<String, String>,
}

impl JsonRecordFormat {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    fn record(&self, event: &Event<'_>, context: Map<String, Value>) -> Map<String, Value> {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();

        let mut always = Map::new();
        always.insert(
            "message".into(),
            Value::String(visitor.message.take().unwrap_or_default()),
        );
        always.insert(
            "timestamp".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let attribute = |name: &str| -> Option<Value> {
            match name {
                "level" | "levelname" => Some(Value::from(meta.level().as_str())),
                "target" | "name" => Some(Value::from(meta.target())),
                "module" => meta.module_path().map(Value::from),
                "file" | "filename" => meta.file().map(Value::from),
                "line" | "lineno" => meta.line().map(Value::from),
                "thread" | "threadName" => std::thread::current().name().map(Value::from),
                _ => None,
            }
        };

        let mut record = Map::new();
        for (key, source) in &self.fields {
            let value = always
                .remove(source)
                .or_else(|| attribute(source))
                .or_else(|| visitor.fields.remove(source))
                .unwrap_or(Value::Null);
            record.insert(key.clone(), value);
        }
        record.extend(always);

        if self.fields.is_empty() {
            record.insert("level".into(), Value::from(meta.level().as_str()));
            record.insert("target".into(), Value::from(meta.target()));
        }
        for (key, value) in visitor.fields.into_iter().chain(context) {
            record.entry(key).or_insert(value);
        }
        record
    }
}

impl<S, N> FormatEvent<S, N> for JsonRecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Innermost span fields win over outer ones
        let mut context = Map::new();
        if let Some(scope) = ctx.event_scope() {
            for span in scope {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<FormattedFields<N>>() else {
                    continue;
                };
                if let Ok(Value::Object(values)) = serde_json::from_str::<Value>(&fields.fields) {
                    for (key, value) in values {
                        context.entry(key).or_insert(value);
                    }
                }
            }
        }

        let record = self.record(event, context);
        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}
