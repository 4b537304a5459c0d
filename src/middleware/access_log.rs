//! Access logging middleware.
//!
//! Logs HTTP requests in a structured format for analysis.

use crate::core::{Context, Request, Response};

use super::{Middleware, MiddlewareResult};

/// Request fields captured on the way in.
struct RequestLine {
    method: String,
    path: String,
    query: Option<String>,
    user_agent: Option<String>,
}

/// Access logging middleware.
///
/// Log entries are emitted at INFO level with target "access".
pub struct AccessLogMiddleware {
    enabled: bool,
}

impl AccessLogMiddleware {
    /// Create an enabled access log middleware.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with enabled/disabled state.
    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for AccessLogMiddleware {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Middleware for AccessLogMiddleware {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn priority(&self) -> i32 {
        -90 // Run early for requests, late for responses
    }

    fn on_request(&self, req: Request, ctx: &mut Context) -> MiddlewareResult {
        if self.enabled {
            ctx.set(
                "access_log",
                RequestLine {
                    method: req.method().to_string(),
                    path: req.path().to_string(),
                    query: req.query().map(str::to_string),
                    user_agent: req.user_agent().map(str::to_string),
                },
            );
        }

        MiddlewareResult::Next(req)
    }

    fn on_response(&self, res: Response, ctx: &Context) -> Response {
        if !self.enabled {
            return res;
        }

        let Some(line) = ctx.get::<RequestLine>("access_log") else {
            return res;
        };

        let status = res.status().as_u16();

        tracing::info!(
            target: "access",
            method = %line.method,
            path = %line.path,
            query = line.query.as_deref(),
            route = ctx.route.as_deref(),
            status = status,
            bytes = res.body_len() as u64,
            duration_ms = ctx.elapsed_ms(),
            ip = %ctx.client_ip,
            ua = line.user_agent.as_deref(),
            request_id = %ctx.request_id,
            trace_id = %ctx.trace_id,
            span_id = %ctx.span_id,
            http = %ctx.http_version,
            "{} {} {}",
            line.method,
            line.path,
            status
        );

        res
    }
}
