//! HTTP response abstraction for middleware and handlers.

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// Pre-allocated static header values for common content types.
mod content_types {
    use super::*;
    pub static TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
    pub static APPLICATION_JSON: HeaderValue =
        HeaderValue::from_static("application/json; charset=utf-8");
}

/// Pre-allocated static bodies for common responses.
mod static_bodies {
    use super::*;
    pub static NOT_FOUND: Bytes = Bytes::from_static(b"404 page not found");
    pub static BAD_REQUEST: Bytes = Bytes::from_static(b"400 bad request");
}

/// JSON body shape shared by every stub endpoint.
#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

/// HTTP response.
///
/// Note: Clone is intentionally not derived to prevent expensive copies.
/// Use references or move semantics instead.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create a new response builder.
    #[inline]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Create a 200 OK response with body.
    #[inline]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Create a 200 OK JSON response `{"message": text}`.
    pub fn message(text: &str) -> Self {
        let body = serde_json::to_vec(&Message { message: text }).unwrap_or_default();
        Self::builder().json().body(body).build()
    }

    /// Create a 404 response (uses static body).
    #[inline]
    pub fn not_found() -> Self {
        Self::builder()
            .status(StatusCode::NOT_FOUND)
            .text()
            .body(static_bodies::NOT_FOUND.clone())
            .build()
    }

    /// Redirect to `location`: `301` for GET, `307` for other methods so the
    /// client repeats the method and body.
    pub fn redirect(method: &http::Method, location: &str) -> Self {
        let status = if method == http::Method::GET {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::TEMPORARY_REDIRECT
        };
        Self::builder()
            .status(status)
            .header(header::LOCATION, location)
            .build()
    }

    /// Create a 400 response for unreadable requests.
    #[inline]
    pub fn bad_request() -> Self {
        Self::builder()
            .status(StatusCode::BAD_REQUEST)
            .text()
            .body(static_bodies::BAD_REQUEST.clone())
            .build()
    }

    /// Create a 500 Internal Server Error response.
    ///
    /// An empty message yields an empty body without a content type.
    #[inline]
    pub fn internal_error(msg: &str) -> Self {
        if msg.is_empty() {
            return Self::empty(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Self::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .text()
            .body(Bytes::copy_from_slice(msg.as_bytes()))
            .build()
    }

    /// Create an empty response with given status.
    #[inline]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    // Getters

    /// Get the status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the response body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get a header value by string name (case-insensitive).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    // Modifiers

    /// Set the status code.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a header by string name and value.
    #[inline]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    // Status checks

    /// Check if this is a server error (5xx).
    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Get Content-Type header.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Get body length.
    #[inline]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(StatusCode::OK)
    }
}

impl From<Response> for http::Response<Full<Bytes>> {
    fn from(res: Response) -> Self {
        let mut out = http::Response::new(Full::new(res.body));
        *out.status_mut() = res.status;
        *out.headers_mut() = res.headers;
        out
    }
}

/// Builder for creating HTTP responses.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Option<HeaderMap>, // Lazy allocation
    body: Bytes,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// Create a new response builder.
    #[inline]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: None, // Don't allocate until needed
            body: Bytes::new(),
        }
    }

    /// Set the status code.
    #[inline]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add header with typed HeaderName and HeaderValue (zero-alloc for static values).
    #[inline]
    pub fn header_value(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Add header by strings.
    #[inline]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers
                .get_or_insert_with(HeaderMap::new)
                .insert(name, value);
        }
        self
    }

    /// Set the body.
    #[inline]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set Content-Type to application/json (uses static HeaderValue).
    #[inline]
    pub fn json(self) -> Self {
        self.header_value(header::CONTENT_TYPE, content_types::APPLICATION_JSON.clone())
    }

    /// Set Content-Type to text/plain (uses static HeaderValue).
    #[inline]
    pub fn text(self) -> Self {
        self.header_value(header::CONTENT_TYPE, content_types::TEXT_PLAIN.clone())
    }

    /// Build the response.
    #[inline]
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers.unwrap_or_default(),
            body: self.body,
        }
    }
}
