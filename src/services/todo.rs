//! Todo service routes.

use crate::server::{Router, RoutingError, StaticMessage};

pub const NAME: &str = "todo";
pub const DEFAULT_PORT: u16 = 3001;

/// Route table of the todo service.
pub fn router() -> Result<Router, RoutingError> {
    let mut router = Router::new();
    router
        .get("/ping", StaticMessage("pong"))?
        .get("/:id", StaticMessage("Get Todo by Id"))?
        .post("/", StaticMessage("pong"))?
        .patch("/:id", StaticMessage("edit to do by id"))?
        .delete("/:id", StaticMessage("delete to do by id"))?
        .delete("user/:id", StaticMessage("delete to do by id"))?;
    Ok(router)
}
