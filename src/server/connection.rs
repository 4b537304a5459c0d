//! Connection handling and per-request dispatch.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use opentelemetry::trace::TraceContextExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::routing::{RouteMatch, Router};
use crate::core::{Context, Error, HttpVersion, Request, Response};
use crate::middleware::{catch_panic, MiddlewareChain, RecoveryMode};
use crate::observability::tracing_middleware::{
    end_http_span, extract_context_from_headers, start_http_span,
};

/// Check if error is a common connection-level error that should be silently ignored.
#[inline]
fn is_connection_error(err_str: &str) -> bool {
    err_str.contains("connection reset")
        || err_str.contains("broken pipe")
        || err_str.contains("Connection reset")
        || err_str.contains("os error 104")
        || err_str.contains("os error 32")
        || err_str.contains("timed out")
        || err_str.contains("HeaderTimeout")
}

/// Keeps the active connection count accurate, even if a task panics.
pub(super) struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    pub(super) fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Connection handler context shared by all connections of a server.
pub(super) struct ConnectionContext {
    pub router: Arc<Router>,
    pub chain: MiddlewareChain,
    pub recovery: RecoveryMode,
    /// Header read timeout for HTTP/1 connections.
    pub header_timeout: Duration,
}

impl ConnectionContext {
    /// Serve one TCP connection until it closes.
    ///
    /// When shutdown fires, hyper is told to finish in-flight requests and
    /// close (GOAWAY on HTTP/2, `Connection: close` on HTTP/1).
    pub(super) async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        mut shutdown_rx: watch::Receiver<bool>,
        _guard: ConnectionGuard,
    ) {
        let ctx = Arc::clone(&self);
        let service = service_fn(move |req| {
            let ctx = Arc::clone(&ctx);
            async move { ctx.handle_request(req, remote_addr).await }
        });

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(Some(self.header_timeout))
            .keep_alive(true);

        let conn = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let finished = tokio::select! {
            res = conn.as_mut() => Some(res),
            _ = shutdown_rx.changed() => None,
        };

        let result = match finished {
            Some(res) => res,
            None => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        if let Err(err) = result {
            let err_str = format!("{:?}", err);
            if !is_connection_error(&err_str) {
                debug!("Connection error: {:?}", err);
            }
        }
    }

    async fn handle_request(
        &self,
        req: hyper::Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Result<http::Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let err = Error::from(e);
                debug!(error = %err, "Failed to read request body");
                return Ok(Response::bad_request().into());
            }
        };

        let version = HttpVersion::from_http(parts.version);
        let parent = extract_context_from_headers(&parts.headers);
        let route = self.router.find(&parts.method, parts.uri.path());
        let pattern = route.as_ref().map(|m| m.pattern.clone());

        let server_cx = start_http_span(
            &parts.method,
            &parts.uri,
            version,
            pattern.as_deref(),
            remote_addr.ip(),
            &parent,
        );

        let mut ctx = Context::builder(remote_addr.ip())
            .otel(server_cx.clone())
            .parent(&parent)
            .http_version(version)
            .route(pattern)
            .build();

        let request = Request::from_parts(parts, body);
        let response = self
            .chain
            .run(request, &mut ctx, |req| {
                self.dispatch(route, req, server_cx.clone())
            })
            .await;

        end_http_span(&server_cx, response.status().as_u16(), ctx.elapsed_ms());

        Ok(response.into())
    }

    /// Run the matched handler inside a span parented to the server span.
    async fn dispatch(
        &self,
        route: Option<RouteMatch>,
        mut req: Request,
        server_cx: opentelemetry::Context,
    ) -> Response {
        let Some(route) = route else {
            return self.unmatched(&req);
        };

        let span = tracing::info_span!(
            "handler",
            otel.name = %route.pattern,
            http.route = %route.pattern,
        );
        span.set_parent(server_cx.clone());

        // Without the bridge layer the handler span has no OTel identity
        let handler_cx = span.context();
        let trace_cx = if handler_cx.span().span_context().is_valid() {
            handler_cx
        } else {
            server_cx
        };

        req.set_params(route.params);
        req.set_trace_context(trace_cx);

        let handler = route.handler;
        catch_panic(handler.call(req), self.recovery)
            .instrument(span)
            .await
    }

    /// Redirect a path that misses a route only by its trailing slash,
    /// otherwise answer `404`.
    fn unmatched(&self, req: &Request) -> Response {
        match self.router.redirect_path(req.method(), req.path()) {
            Some(mut location) => {
                if let Some(query) = req.query() {
                    location.push('?');
                    location.push_str(query);
                }
                Response::redirect(req.method(), &location)
            }
            None => Response::not_found(),
        }
    }
}
