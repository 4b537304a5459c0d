//! Todo service routes over HTTP.

use crate::helpers::*;
use observability_demo::services::Service;
use reqwest::{Method, StatusCode};

#[tokio::test]
async fn test_ping() {
    let server = TestServer::start(Service::Todo).await;
    assert_message(server.get("/ping").await, "pong").await;
}

#[tokio::test]
async fn test_crud_stubs() {
    let server = TestServer::start(Service::Todo).await;

    assert_message(server.get("/15").await, "Get Todo by Id").await;
    assert_message(server.request(Method::POST, "/").await, "pong").await;
    assert_message(server.request(Method::PATCH, "/15").await, "edit to do by id").await;
    assert_message(server.request(Method::DELETE, "/15").await, "delete to do by id").await;
    assert_message(
        server.request(Method::DELETE, "/user/15").await,
        "delete to do by id",
    )
    .await;
}

#[tokio::test]
async fn test_not_found() {
    let server = TestServer::start(Service::Todo).await;

    for (method, path) in [
        (Method::GET, "/15/todo"),
        (Method::PUT, "/15"),
        (Method::DELETE, "/user/1/x"),
    ] {
        let resp = server.request(method, path).await;
        assert_status(&resp, StatusCode::NOT_FOUND);
        assert_header(&resp, "content-type", "text/plain; charset=utf-8");
        assert_eq!(resp.text().await.unwrap(), "404 page not found");
    }
}

#[tokio::test]
async fn test_trailing_slash_redirect() {
    let server = TestServer::start(Service::Todo).await;

    let resp = server.get("/ping/").await;
    assert_status(&resp, StatusCode::MOVED_PERMANENTLY);
    assert_header(&resp, "location", "/ping");

    let resp = server.get("/ping/?verbose=1").await;
    assert_status(&resp, StatusCode::MOVED_PERMANENTLY);
    assert_header(&resp, "location", "/ping?verbose=1");

    // Non-GET methods keep their method on the redirect
    let resp = server.request(Method::PATCH, "/15/").await;
    assert_status(&resp, StatusCode::TEMPORARY_REDIRECT);
    assert_header(&resp, "location", "/15");
}

#[tokio::test]
async fn test_plain_recovery() {
    use observability_demo::core::{Request, Response};
    use observability_demo::server::Router;

    async fn explode(_req: Request) -> Response {
        panic!("kaboom")
    }

    let mut router = Router::new();
    router.get("/explode", explode).unwrap();
    let server = TestServer::with_router(router, Service::Todo.recovery()).await;

    let resp = server.get("/explode").await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.text().await.unwrap().is_empty());

    // The connection task survives the panic
    assert_status(&server.get("/explode").await, StatusCode::INTERNAL_SERVER_ERROR);
}
