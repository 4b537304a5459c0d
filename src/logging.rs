//! Unified JSON logging with trace correlation.
//!
//! Log format:
//! ```json
//! {"ts":"2024-12-28T15:04:05.123Z","level":"info","type":"app","msg":"Server started","ctx":{"service":"todo","trace_id":"4bf9...","span_id":"00f0..."},"data":{}}
//! ```
//!
//! `trace_id` and `span_id` are present when the event is emitted inside a
//! span tracked by the OpenTelemetry bridge layer.

use std::collections::HashMap;
use std::fmt;

use opentelemetry::trace::TraceContextExt;
use serde::Serialize;
use tracing::{Event, Level, Subscriber};
use tracing_opentelemetry::OtelData;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Log entry with unified structure.
#[derive(Serialize)]
pub struct LogEntry<'a> {
    /// ISO 8601 timestamp with milliseconds, UTC
    pub ts: &'a str,
    /// Log level: debug, info, warn, error
    pub level: &'a str,
    /// Log type: app, access, error
    #[serde(rename = "type")]
    pub log_type: &'a str,
    /// Short human-readable message
    pub msg: &'a str,
    /// Context: service and trace correlation
    pub ctx: LogContext<'a>,
    /// Event fields
    pub data: HashMap<String, serde_json::Value>,
}

/// Log context.
#[derive(Serialize, Default)]
pub struct LogContext<'a> {
    /// Service name
    pub service: &'a str,
    /// W3C trace id of the enclosing span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span id of the enclosing span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

/// Logging setup errors.
#[derive(Debug)]
pub enum LoggingError {
    /// Filter directive could not be parsed.
    Filter(String),
    /// A global subscriber is already installed.
    Install(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Filter(msg) => write!(f, "invalid log filter: {}", msg),
            LoggingError::Install(msg) => write!(f, "failed to install logger: {}", msg),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Install the global subscriber.
///
/// The fmt layer is filtered by `config.filter`. When `tracer` is given, an
/// OpenTelemetry layer exports `tracing` spans at INFO and above through it.
pub fn init(
    config: &LoggingConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| LoggingError::Filter(e.to_string()))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::with_capacity(2);

    match config.format {
        LogFormat::Json => layers.push(
            tracing_subscriber::fmt::layer()
                .event_format(JsonFormatter::new(&config.service_name))
                .with_filter(filter)
                .boxed(),
        ),
        LogFormat::Pretty => layers.push(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_filter(filter)
                .boxed(),
        ),
    }

    if let Some(tracer) = tracer {
        layers.push(
            tracing_opentelemetry::layer()
                .with_tracer(tracer)
                .with_filter(LevelFilter::INFO)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

/// Custom JSON formatter for tracing.
pub struct JsonFormatter {
    service_name: String,
}

impl JsonFormatter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
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
        let meta = event.metadata();
        let level = match *meta.level() {
            Level::TRACE => "debug",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };

        // Determine log type from target
        let log_type = if meta.target() == "access" {
            "access"
        } else if *meta.level() == Level::ERROR {
            "error"
        } else {
            "app"
        };

        // Collect fields
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let ts = now_iso8601();
        let msg = visitor.message.unwrap_or_default();

        let mut log_ctx = LogContext {
            service: &self.service_name,
            ..Default::default()
        };

        if let Some(span) = ctx.lookup_current() {
            let extensions = span.extensions();
            if let Some(otel) = extensions.get::<OtelData>() {
                let parent = otel.parent_cx.span();
                let parent_sc = parent.span_context();
                let trace_id = if parent_sc.is_valid() {
                    Some(parent_sc.trace_id())
                } else {
                    otel.builder.trace_id
                };
                log_ctx.trace_id = trace_id.map(|id| id.to_string());
                log_ctx.span_id = otel.builder.span_id.map(|id| id.to_string());
            }
        }

        let entry = LogEntry {
            ts: &ts,
            level,
            log_type,
            msg: &msg,
            ctx: log_ctx,
            data: visitor.fields,
        };

        writeln!(
            writer,
            "{}",
            serde_json::to_string(&entry).unwrap_or_default()
        )
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
fn now_iso8601() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond()
    )
}

/// Field visitor for collecting tracing fields.
struct FieldVisitor {
    message: Option<String>,
    fields: HashMap<String, serde_json::Value>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: None,
            fields: HashMap::new(),
        }
    }

    /// Store a field; dotted names (`ping.name`) nest into objects.
    fn insert(&mut self, name: &str, value: serde_json::Value) {
        match name.split_once('.') {
            None => {
                self.fields.insert(name.to_string(), value);
            }
            Some((head, rest)) => {
                let slot = self.fields.entry(head.to_string()).or_default();
                nest(slot, rest, value);
            }
        }
    }
}

fn nest(slot: &mut serde_json::Value, path: &str, value: serde_json::Value) {
    if !slot.is_object() {
        *slot = serde_json::Value::Object(serde_json::Map::new());
    }
    let serde_json::Value::Object(map) = slot else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => nest(map.entry(head).or_insert(serde_json::Value::Null), rest, value),
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value).trim_matches('"').to_string());
        } else {
            self.insert(field.name(), serde_json::Value::String(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field.name(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.insert(field.name(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.insert(field.name(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.insert(field.name(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.insert(field.name(), serde_json::json!(value));
    }
}
