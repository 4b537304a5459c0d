//! Graceful shutdown: stop accepting, finish in-flight requests, drain.

use std::time::Duration;

use crate::helpers::*;
use observability_demo::services::Service;
use reqwest::StatusCode;

#[tokio::test]
async fn test_in_flight_request_completes() {
    let mut server = TestServer::start(Service::User).await;

    // ~850ms handler
    let in_flight = tokio::spawn({
        let client = server.client.clone();
        let url = format!("{}/internal-tracing", server.base_url);
        async move { client.get(url).send().await }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.server.active_connections(), 1);

    server.stop_accepting().await;
    assert!(server.server.is_shutting_down());

    let resp = in_flight.await.unwrap().expect("In-flight request failed");
    assert_status(&resp, StatusCode::OK);
    assert_eq!(message(resp).await, "ok");

    assert!(server.server.wait_for_drain(Duration::from_secs(5)).await);
    assert_eq!(server.server.active_connections(), 0);
}

#[tokio::test]
async fn test_listener_closed_after_shutdown() {
    let mut server = TestServer::start(Service::Todo).await;
    assert_message(server.get("/ping").await, "pong").await;

    server.stop_accepting().await;
    assert!(server.server.wait_for_drain(Duration::from_secs(5)).await);

    let connect = tokio::net::TcpStream::connect(server.addr).await;
    assert!(connect.is_err(), "Listener should be closed");
}

#[tokio::test]
async fn test_drain_with_idle_connection() {
    let mut server = TestServer::start(Service::Todo).await;

    // Keep-alive connection stays open in the client pool
    assert_message(server.get("/ping").await, "pong").await;
    assert_eq!(server.server.active_connections(), 1);

    server.stop_accepting().await;
    assert!(server.server.wait_for_drain(Duration::from_secs(5)).await);
}
