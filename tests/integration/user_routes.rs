//! User service routes over HTTP.

use std::time::{Duration, Instant};

use crate::helpers::*;
use observability_demo::services::Service;
use reqwest::{Method, StatusCode};

#[tokio::test]
async fn test_ping() {
    let server = TestServer::start(Service::User).await;
    assert_message(server.get("/ping").await, "pong").await;
}

#[tokio::test]
async fn test_user_stubs() {
    let server = TestServer::start(Service::User).await;

    assert_message(server.get("/42").await, "get User data").await;
    assert_message(server.request(Method::POST, "/").await, "create user data").await;
    assert_message(server.request(Method::PATCH, "/42").await, "edit user data").await;
    assert_message(server.request(Method::DELETE, "/42").await, "delete user data").await;
}

#[tokio::test]
async fn test_todo_sub_routes() {
    let server = TestServer::start(Service::User).await;

    assert_message(server.get("/42/todo").await, "get all user's todo").await;
    assert_message(
        server.request(Method::POST, "/42/todo").await,
        "create new  todo user data",
    )
    .await;
    assert_message(
        server.request(Method::PATCH, "/42/todo/7").await,
        "edit  todo user data",
    )
    .await;
    assert_message(
        server.request(Method::DELETE, "/42/todo/7").await,
        "delete  todo user data",
    )
    .await;
}

#[tokio::test]
async fn test_panic_is_recovered() {
    let server = TestServer::start(Service::User).await;

    let resp = server.get("/panic").await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "error: Get Panic");

    // Server keeps answering afterwards
    assert_message(server.get("/ping").await, "pong").await;
}

#[tokio::test]
async fn test_internal_tracing() {
    let server = TestServer::start(Service::User).await;

    let start = Instant::now();
    assert_message(server.get("/internal-tracing").await, "ok").await;

    // 150ms + slowest child 600ms + 100ms
    assert!(start.elapsed() >= Duration::from_millis(850));
}

#[tokio::test]
async fn test_unknown_sub_route() {
    let server = TestServer::start(Service::User).await;

    let resp = server.get("/42/todo/7/extra").await;
    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "404 page not found");
}
