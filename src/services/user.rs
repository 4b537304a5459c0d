//! User service routes.
//!
//! Besides the stubs, `/ping` emits five log events across three levels, `/panic`
//! exercises panic recovery and `/internal-tracing` runs the nested span
//! example inside the request trace.

use std::time::Duration;

use crate::core::{Request, Response};
use crate::server::{Router, RoutingError, StaticMessage};

use super::nested;

pub const NAME: &str = "user";
pub const DEFAULT_PORT: u16 = 8081;

/// Route table of the user service.
pub fn router() -> Result<Router, RoutingError> {
    let mut router = Router::new();
    router
        .get("/ping", ping)?
        .get("/panic", get_panic)?
        .get("/internal-tracing", internal_tracing)?
        .get("/:id", StaticMessage("get User data"))?
        .post("/", StaticMessage("create user data"))?
        .patch("/:id", StaticMessage("edit user data"))?
        .delete("/:id", StaticMessage("delete user data"))?
        .get("/:id/todo", StaticMessage("get all user's todo"))?
        .post("/:id/todo", StaticMessage("create new  todo user data"))?
        .patch("/:id/todo/:todoId", StaticMessage("edit  todo user data"))?
        .delete("/:id/todo/:todoId", StaticMessage("delete  todo user data"))?;
    Ok(router)
}

async fn ping(_req: Request) -> Response {
    // Events inside the handler span are exported as span events too
    tracing::info!(input = 1, ping.name = "John", ping.duraion = 100, "return pong");
    tracing::info!(input = 1, ping.name = "John", ping.duraion = 100, "return pong otel");
    tracing::warn!(input = 1, ping.name = "John", ping.duraion = 100, "return pong otel");
    tracing::warn!("try warn");
    tracing::error!("try error");

    Response::message("pong")
}

async fn get_panic(_req: Request) -> Response {
    panic!("Get Panic")
}

async fn internal_tracing(req: Request) -> Response {
    tokio::time::sleep(Duration::from_millis(150)).await;

    nested::parent(req.trace_context()).await;

    tokio::time::sleep(Duration::from_millis(100)).await;

    Response::message("ok")
}
