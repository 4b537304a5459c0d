//! Method + path routing with `:name` parameter segments.
//!
//! Each method gets its own [`matchit`] tree. A `:name` segment captures one
//! non-empty path segment and static segments take priority over parameters,
//! so `/ping` beats `/:id`. Registering two patterns that differ only in
//! parameter names is a conflict.
//!
//! A path that misses only by a trailing slash (`/ping/` for `/ping`) is not
//! matched; [`Router::redirect_path`] names the path to redirect to instead.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use matchit::{InsertError, MatchError};
use percent_encoding::percent_decode_str;

use crate::core::{Params, Request, Response};

/// Request handler.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for a routed request.
    async fn call(&self, req: Request) -> Response;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn call(&self, req: Request) -> Response {
        (self)(req).await
    }
}

/// Handler answering `200 OK` with `{"message": ...}`.
#[derive(Clone, Copy, Debug)]
pub struct StaticMessage(pub &'static str);

#[async_trait]
impl Handler for StaticMessage {
    async fn call(&self, _req: Request) -> Response {
        Response::message(self.0)
    }
}

/// Route registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Same method and pattern registered twice.
    Duplicate { method: Method, pattern: String },
    /// `:` segment without a name.
    EmptyParamName { pattern: String },
    /// Pattern overlaps an existing one in a way the tree cannot order.
    Ambiguous {
        method: Method,
        pattern: String,
        existing: String,
    },
    /// Pattern rejected by the route tree for another reason.
    Invalid { pattern: String, message: String },
}

impl RoutingError {
    fn from_insert(method: Method, pattern: String, err: InsertError) -> Self {
        match err {
            InsertError::Conflict { with } => RoutingError::Ambiguous {
                method,
                pattern,
                existing: with,
            },
            InsertError::UnnamedParam => RoutingError::EmptyParamName { pattern },
            other => RoutingError::Invalid {
                pattern,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::Duplicate { method, pattern } => {
                write!(f, "route {} {} is already registered", method, pattern)
            }
            RoutingError::EmptyParamName { pattern } => {
                write!(f, "empty parameter name in pattern '{}'", pattern)
            }
            RoutingError::Ambiguous {
                method,
                pattern,
                existing,
            } => write!(
                f,
                "route {} {} conflicts with existing route {}",
                method, pattern, existing
            ),
            RoutingError::Invalid { pattern, message } => {
                write!(f, "invalid pattern '{}': {}", pattern, message)
            }
        }
    }
}

impl std::error::Error for RoutingError {}

struct Route {
    pattern: String,
    handler: Arc<dyn Handler>,
}

/// Result of a successful route lookup.
#[derive(Clone)]
pub struct RouteMatch {
    /// Normalised pattern that matched (e.g. `/:id/todo`).
    pub pattern: String,
    /// Captured path parameters.
    pub params: Params,
    /// Handler registered for the route.
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Route table for one service.
#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, matchit::Router<Route>>,
    registered: HashSet<(Method, String)>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a GET route.
    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.add(Method::GET, pattern, handler)
    }

    /// Register a POST route.
    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.add(Method::POST, pattern, handler)
    }

    /// Register a PATCH route.
    pub fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.add(Method::PATCH, pattern, handler)
    }

    /// Register a DELETE route.
    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.add(Method::DELETE, pattern, handler)
    }

    /// Register a route for any method.
    pub fn add<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RoutingError> {
        let pattern = normalize(pattern);
        let key = (method.clone(), pattern.clone());
        if self.registered.contains(&key) {
            return Err(RoutingError::Duplicate { method, pattern });
        }

        let route = Route {
            pattern: pattern.clone(),
            handler: Arc::new(handler),
        };
        self.trees
            .entry(method.clone())
            .or_insert_with(matchit::Router::new)
            .insert(pattern.clone(), route)
            .map_err(|e| RoutingError::from_insert(method, pattern, e))?;

        self.registered.insert(key);
        Ok(self)
    }

    /// Find the route for a request.
    ///
    /// Returns `None` when no pattern matches the path or none is registered
    /// for the method.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let matched = self.trees.get(method)?.at(path).ok()?;

        let mut params = Params::new();
        for (name, value) in matched.params.iter() {
            params.push(name, percent_decode_str(value).decode_utf8_lossy().into_owned());
        }

        Some(RouteMatch {
            pattern: matched.value.pattern.clone(),
            params,
            handler: Arc::clone(&matched.value.handler),
        })
    }

    /// Path to redirect to when `path` misses a route only by its trailing
    /// slash.
    pub fn redirect_path(&self, method: &Method, path: &str) -> Option<String> {
        match self.trees.get(method)?.at(path) {
            Err(MatchError::ExtraTrailingSlash) => path.strip_suffix('/').map(str::to_string),
            Err(MatchError::MissingTrailingSlash) => Some(format!("{}/", path)),
            _ => None,
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// Ensure a leading slash.
fn normalize(pattern: &str) -> String {
    if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    }
}
