//! Request tracing helpers for OpenTelemetry.
//!
//! Provides server span creation and W3C context propagation for HTTP
//! requests.

use std::net::IpAddr;

use http::{HeaderMap, Method, Uri};
use opentelemetry::{
    global,
    propagation::{Extractor, Injector, TextMapPropagator},
    trace::{SpanKind, Status, TraceContextExt, Tracer},
    Context, KeyValue,
};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_semantic_conventions::trace::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, NETWORK_PROTOCOL_VERSION, URL_PATH,
    URL_QUERY,
};

use crate::core::HttpVersion;

use super::otel::TRACER_NAME;

const CLIENT_ADDRESS: &str = "client.address";

/// Extract W3C Trace Context from incoming request headers.
///
/// Uses the W3C propagator directly so incoming context is honoured even
/// when no global propagator is installed.
pub fn extract_context_from_headers(headers: &HeaderMap) -> Context {
    let propagator = TraceContextPropagator::new();
    let extractor = HeaderExtractor(headers);
    propagator.extract(&extractor)
}

/// Inject W3C Trace Context into a header map.
pub fn inject_context_into_headers(headers: &mut HeaderMap, context: &Context) {
    let propagator = TraceContextPropagator::new();
    let mut injector = HeaderInjector(headers);
    propagator.inject_context(context, &mut injector);
}

/// Span name: `"{METHOD} {route}"`, or the raw path when nothing matched.
pub fn span_name(method: &Method, path: &str, route: Option<&str>) -> String {
    format!("{} {}", method, route.unwrap_or(path))
}

/// Create a server span for an HTTP request.
///
/// Returns a context holding the span, for use as parent of nested spans.
pub fn start_http_span(
    method: &Method,
    uri: &Uri,
    version: HttpVersion,
    route: Option<&str>,
    client: IpAddr,
    parent_context: &Context,
) -> Context {
    let tracer = global::tracer(TRACER_NAME);

    let mut attributes = vec![
        KeyValue::new(HTTP_REQUEST_METHOD, method.to_string()),
        KeyValue::new(URL_PATH, uri.path().to_string()),
        KeyValue::new(NETWORK_PROTOCOL_VERSION, version.number()),
        KeyValue::new(CLIENT_ADDRESS, client.to_string()),
    ];
    if let Some(query) = uri.query() {
        attributes.push(KeyValue::new(URL_QUERY, query.to_string()));
    }
    if let Some(route) = route {
        attributes.push(KeyValue::new(HTTP_ROUTE, route.to_string()));
    }

    let span = tracer
        .span_builder(span_name(method, uri.path(), route))
        .with_kind(SpanKind::Server)
        .with_attributes(attributes)
        .start_with_context(&tracer, parent_context);

    parent_context.with_span(span)
}

/// End an HTTP span with response information.
pub fn end_http_span(context: &Context, status_code: u16, duration_ms: f64) {
    let span = context.span();

    span.set_attribute(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, status_code as i64));
    span.set_attribute(KeyValue::new("http.request.duration_ms", duration_ms));

    // Client errors are not span errors per OpenTelemetry semantic conventions
    if status_code >= 500 {
        span.set_status(Status::error(format!("HTTP {}", status_code)));
    } else {
        span.set_status(Status::Ok);
    }

    span.end();
}

// Header extractor for OpenTelemetry propagation
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

// Header injector for OpenTelemetry propagation
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = http::header::HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(val) = http::header::HeaderValue::from_str(&value) {
                self.0.insert(name, val);
            }
        }
    }
}
