//! HTTP request abstraction for middleware and handlers.

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, Method, Uri};

use super::Params;

/// Lazily initialized custom header names.
static X_REQUEST_ID: std::sync::LazyLock<HeaderName> =
    std::sync::LazyLock::new(|| HeaderName::from_static("x-request-id"));

/// HTTP request for middleware and handlers.
///
/// Note: Clone is intentionally not derived to prevent expensive copies.
/// Use references or move semantics instead.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    trace_context: opentelemetry::Context,
}

impl Request {
    /// Create a new request.
    #[inline]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            params: Params::new(),
            trace_context: opentelemetry::Context::new(),
        }
    }

    /// Build from hyper request parts and a buffered body.
    #[inline]
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: Params::new(),
            trace_context: opentelemetry::Context::new(),
        }
    }

    /// Get the HTTP method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the request path.
    #[inline]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the query string.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the request body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get a header value by string name (case-insensitive).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get User-Agent header.
    #[inline]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    /// Get X-Request-ID header.
    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(&*X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }

    /// Path parameters captured by the router.
    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Single path parameter by name.
    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Replace the captured path parameters.
    #[inline]
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// OpenTelemetry context of the span the handler runs in.
    #[inline]
    pub fn trace_context(&self) -> &opentelemetry::Context {
        &self.trace_context
    }

    /// Attach the handler span context.
    #[inline]
    pub fn set_trace_context(&mut self, cx: opentelemetry::Context) {
        self.trace_context = cx;
    }
}

impl<B> From<http::Request<B>> for Request
where
    B: Into<Bytes>,
{
    fn from(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body.into())
    }
}
