//! Response headers that tie a response back to its trace.
//!
//! Every response carries `x-request-id` (the incoming value when the client
//! sent one, otherwise derived from the trace id) and `traceparent`.

use http::header::HeaderName;
use http::HeaderValue;

use crate::core::{Context, Request, Response};
use crate::observability::tracing_middleware::inject_context_into_headers;

use super::{Middleware, MiddlewareResult};

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");

/// Context key holding the client supplied request id.
const INCOMING_REQUEST_ID: &str = "incoming_request_id";

/// Adds `x-request-id` and `traceparent` to responses.
#[derive(Default)]
pub struct TraceHeadersMiddleware;

impl TraceHeadersMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for TraceHeadersMiddleware {
    fn name(&self) -> &'static str {
        "trace_headers"
    }

    fn priority(&self) -> i32 {
        -80
    }

    fn on_request(&self, req: Request, ctx: &mut Context) -> MiddlewareResult {
        if let Some(id) = req.request_id().filter(|id| !id.is_empty()) {
            ctx.set(INCOMING_REQUEST_ID, id.to_string());
        }
        MiddlewareResult::Next(req)
    }

    fn on_response(&self, mut res: Response, ctx: &Context) -> Response {
        let request_id = ctx
            .get::<String>(INCOMING_REQUEST_ID)
            .unwrap_or(&ctx.request_id);
        if let Ok(value) = HeaderValue::from_str(request_id) {
            res.headers_mut().insert(X_REQUEST_ID.clone(), value);
        }

        if ctx.has_valid_span() {
            inject_context_into_headers(res.headers_mut(), &ctx.otel);
        } else {
            // No exportable span: still hand out the ids used in the logs
            let traceparent = format!("00-{}-{}-00", ctx.trace_id, ctx.span_id);
            if let Ok(value) = HeaderValue::from_str(&traceparent) {
                res.headers_mut().insert(TRACEPARENT.clone(), value);
            }
        }

        res
    }
}
