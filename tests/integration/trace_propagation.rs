//! Trace context propagation through request and response headers.

use crate::helpers::*;
use observability_demo::services::Service;
use reqwest::StatusCode;

const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
const PARENT_SPAN_ID: &str = "00f067aa0ba902b7";

fn traceparent_parts(value: &str) -> Vec<String> {
    value.split('-').map(str::to_string).collect()
}

#[tokio::test]
async fn test_incoming_trace_is_continued() {
    let server = TestServer::start(Service::User).await;
    let incoming = format!("00-{}-{}-01", TRACE_ID, PARENT_SPAN_ID);

    let resp = server
        .get_with_headers("/ping", &[("traceparent", incoming.as_str())])
        .await;
    assert_status(&resp, StatusCode::OK);

    let traceparent = header(&resp, "traceparent").expect("traceparent missing");
    let parts = traceparent_parts(traceparent);
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "00");
    assert_eq!(parts[1], TRACE_ID);

    // Request id is derived from the trace id
    let request_id = header(&resp, "x-request-id").expect("x-request-id missing");
    assert!(request_id.starts_with(&TRACE_ID[..12]));
}

#[tokio::test]
async fn test_new_trace_without_parent() {
    let server = TestServer::start(Service::Todo).await;

    let resp = server.get("/ping").await;
    assert_status(&resp, StatusCode::OK);

    let traceparent = header(&resp, "traceparent").expect("traceparent missing");
    let parts = traceparent_parts(traceparent);
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[1].len(), 32);
    assert_eq!(parts[2].len(), 16);
    assert_ne!(parts[1], "0".repeat(32));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start(Service::Todo).await;

    let resp = server
        .get_with_headers("/ping", &[("x-request-id", "req-abc-123")])
        .await;
    assert_header(&resp, "x-request-id", "req-abc-123");
}

#[tokio::test]
async fn test_headers_on_not_found() {
    let server = TestServer::start(Service::Todo).await;

    let resp = server.get("/does/not/exist").await;
    assert_status(&resp, StatusCode::NOT_FOUND);
    assert!(header(&resp, "traceparent").is_some());
    assert!(header(&resp, "x-request-id").is_some());
}

#[tokio::test]
async fn test_malformed_traceparent_starts_new_trace() {
    let server = TestServer::start(Service::Todo).await;

    let resp = server
        .get_with_headers("/ping", &[("traceparent", "not-a-trace")])
        .await;
    assert_status(&resp, StatusCode::OK);

    let traceparent = header(&resp, "traceparent").expect("traceparent missing");
    assert_ne!(traceparent_parts(traceparent)[1], TRACE_ID);
}
