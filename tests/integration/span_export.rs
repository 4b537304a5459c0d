//! Spans exported for real requests: server span, handler span and the
//! nested example, with log events and error status.

use crate::helpers::*;
use observability_demo::services::Service;
use opentelemetry::trace::{SpanId, SpanKind, Status};
use reqwest::StatusCode;

const PARENT_SPAN_ID: &str = "00f067aa0ba902b7";

fn traceparent(trace_id: &str) -> String {
    format!("00-{}-{}-01", trace_id, PARENT_SPAN_ID)
}

#[tokio::test]
async fn test_internal_tracing_span_tree() {
    const TRACE_ID: &str = "0af7651916cd43dd8448eb211c80319c";
    let exporter = span_exporter();
    let server = TestServer::start(Service::User).await;

    let incoming = traceparent(TRACE_ID);
    let resp = server
        .get_with_headers("/internal-tracing", &[("traceparent", incoming.as_str())])
        .await;
    assert_message(resp, "ok").await;

    // Server, handler, Parent and two Child spans
    let spans = finished_spans(&exporter, TRACE_ID, 5).await;

    let server_span = span_named(&spans, "GET /internal-tracing");
    assert_eq!(server_span.span_kind, SpanKind::Server);
    assert_eq!(
        server_span.parent_span_id,
        SpanId::from_hex(PARENT_SPAN_ID).unwrap()
    );

    let handler = span_named(&spans, "/internal-tracing");
    assert_eq!(handler.parent_span_id, server_span.span_context.span_id());

    let parent = span_named(&spans, "Parent");
    assert_eq!(parent.parent_span_id, handler.span_context.span_id());

    let children: Vec<_> = spans.iter().filter(|s| s.name == "Child").collect();
    assert_eq!(children.len(), 2);
    for child in children {
        assert_eq!(child.parent_span_id, handler.span_context.span_id());
    }
}

#[tokio::test]
async fn test_ping_events_on_handler_span() {
    const TRACE_ID: &str = "5b8efff798038103d269b633813fc60c";
    let exporter = span_exporter();
    let server = TestServer::start(Service::User).await;

    let incoming = traceparent(TRACE_ID);
    let resp = server
        .get_with_headers("/ping", &[("traceparent", incoming.as_str())])
        .await;
    assert_message(resp, "pong").await;

    let spans = finished_spans(&exporter, TRACE_ID, 2).await;
    let handler = span_named(&spans, "/ping");

    let names: Vec<&str> = handler.events.iter().map(|e| &*e.name).collect();
    assert_eq!(
        names,
        vec![
            "return pong",
            "return pong otel",
            "return pong otel",
            "try warn",
            "try error"
        ]
    );

    let server_span = span_named(&spans, "GET /ping");
    assert_eq!(server_span.status, Status::Ok);
}

#[tokio::test]
async fn test_recovered_panic_marks_server_span() {
    const TRACE_ID: &str = "a3ce929d0e0e47364bf92f3577b34da6";
    let exporter = span_exporter();
    let server = TestServer::start(Service::User).await;

    let incoming = traceparent(TRACE_ID);
    let resp = server
        .get_with_headers("/panic", &[("traceparent", incoming.as_str())])
        .await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);

    let spans = finished_spans(&exporter, TRACE_ID, 2).await;

    let server_span = span_named(&spans, "GET /panic");
    assert!(matches!(server_span.status, Status::Error { .. }));

    let handler = span_named(&spans, "/panic");
    assert!(handler
        .events
        .iter()
        .any(|e| e.name == "handler panicked, recovered"));
}
