//! Middleware pipeline for request/response processing.
//!
//! This module provides a composable middleware system for handling HTTP requests
//! and responses. Middleware can:
//! - Inspect incoming requests and stash values in the [`Context`]
//! - Short-circuit the pipeline and return early responses
//! - Modify outgoing responses
//!
//! Panic recovery is not a chain member: it wraps the handler future itself,
//! see [`recovery`].
//!
//! # Example
//!
//! ```rust,ignore
//! use observability_demo::middleware::{Middleware, MiddlewareResult, MiddlewareChain};
//! use observability_demo::core::{Request, Response, Context};
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str { "logging" }
//!
//!     fn on_request(&self, req: Request, ctx: &mut Context) -> MiddlewareResult {
//!         println!("Request: {} {}", req.method(), req.path());
//!         MiddlewareResult::Next(req)
//!     }
//! }
//!
//! let chain = MiddlewareChain::new().add(LoggingMiddleware);
//! ```

mod chain;

pub mod access_log;
pub mod recovery;
pub mod trace_headers;

pub use access_log::AccessLogMiddleware;
pub use chain::MiddlewareChain;
pub use recovery::{catch_panic, RecoveryMode};
pub use trace_headers::TraceHeadersMiddleware;

use crate::core::{Context, Request, Response};

/// Result of middleware request processing.
#[derive(Debug)]
pub enum MiddlewareResult {
    /// Continue to the next middleware with the (possibly modified) request.
    Next(Request),
    /// Stop the middleware chain and return this response immediately.
    Stop(Response),
}

impl MiddlewareResult {
    /// Check if this result continues the chain.
    pub fn is_next(&self) -> bool {
        matches!(self, MiddlewareResult::Next(_))
    }

    /// Check if this result stops the chain.
    pub fn is_stop(&self) -> bool {
        matches!(self, MiddlewareResult::Stop(_))
    }
}

/// Trait for implementing middleware.
///
/// The pipeline executes `on_request` in priority order and `on_response`
/// in reverse order.
///
/// ```text
/// Request → MW1.on_request → MW2.on_request → Handler
///                                                ↓
/// Response ← MW1.on_response ← MW2.on_response ←─┘
/// ```
pub trait Middleware: Send + Sync {
    /// Unique name for this middleware (used for logging/debugging).
    fn name(&self) -> &'static str;

    /// Priority for ordering in the chain.
    /// Lower values execute first for requests, last for responses.
    fn priority(&self) -> i32 {
        0
    }

    /// Process an incoming request.
    ///
    /// Return `MiddlewareResult::Next(req)` to continue the chain,
    /// or `MiddlewareResult::Stop(res)` to short-circuit with a response.
    fn on_request(&self, req: Request, _ctx: &mut Context) -> MiddlewareResult {
        MiddlewareResult::Next(req)
    }

    /// Process an outgoing response.
    fn on_response(&self, res: Response, _ctx: &Context) -> Response {
        res
    }
}
