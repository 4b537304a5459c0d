//! Request context for middleware pipeline.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

use opentelemetry::trace::TraceContextExt;

/// HTTP version as static string (no allocation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpVersion(&'static str);

impl HttpVersion {
    pub const HTTP_10: Self = Self("HTTP/1.0");
    pub const HTTP_11: Self = Self("HTTP/1.1");
    pub const HTTP_20: Self = Self("HTTP/2.0");

    /// Get the version string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Version number without the `HTTP/` prefix (`network.protocol.version`).
    #[inline]
    pub fn number(&self) -> &'static str {
        &self.0[5..]
    }

    /// Create from http::Version.
    #[inline]
    pub fn from_http(version: http::Version) -> Self {
        match version {
            http::Version::HTTP_10 => Self::HTTP_10,
            http::Version::HTTP_11 => Self::HTTP_11,
            http::Version::HTTP_2 => Self::HTTP_20,
            _ => Self::HTTP_11, // fallback
        }
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

/// Request context shared across middleware and handlers.
///
/// Context carries request-scoped data through the middleware pipeline:
/// client information, trace identifiers, timing and the matched route.
/// Middleware can also exchange typed values through it.
pub struct Context {
    /// Client IP address.
    pub client_ip: IpAddr,

    /// W3C Trace ID (32 hex chars).
    pub trace_id: String,

    /// Span ID of the server span (16 hex chars).
    pub span_id: String,

    /// Parent span ID (if propagated from upstream).
    pub parent_span_id: Option<String>,

    /// Short request ID for logging.
    pub request_id: String,

    /// Request start time.
    pub started_at: Instant,

    /// HTTP version (no allocation, Copy).
    pub http_version: HttpVersion,

    /// Matched route pattern, `None` when nothing matched.
    pub route: Option<String>,

    /// OpenTelemetry context holding the server span.
    pub otel: opentelemetry::Context,

    /// Custom key-value storage for middleware.
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create a new context with minimal information.
    #[inline]
    pub fn new(client_ip: IpAddr, trace_id: String, span_id: String) -> Self {
        let request_id = make_request_id(&trace_id, &span_id);

        Self {
            client_ip,
            trace_id,
            span_id,
            parent_span_id: None,
            request_id,
            started_at: Instant::now(),
            http_version: HttpVersion::HTTP_11,
            route: None,
            otel: opentelemetry::Context::new(),
            values: HashMap::new(),
        }
    }

    /// Create a context builder for more control.
    #[inline]
    pub fn builder(client_ip: IpAddr) -> ContextBuilder {
        ContextBuilder::new(client_ip)
    }

    /// Set a custom value.
    #[inline]
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// Get a custom value.
    #[inline]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref())
    }

    /// Remove a custom value.
    #[inline]
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        self.values
            .remove(key)
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Whether the OTel context carries a valid span.
    #[inline]
    pub fn has_valid_span(&self) -> bool {
        self.otel.span().span_context().is_valid()
    }

    /// Get elapsed time since request started.
    #[inline]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Get elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Build request ID from trace_id and span_id.
#[inline]
fn make_request_id(trace_id: &str, span_id: &str) -> String {
    let trace_part = &trace_id[..12.min(trace_id.len())];
    let span_part = &span_id[..4.min(span_id.len())];

    let mut id = String::with_capacity(trace_part.len() + 1 + span_part.len());
    id.push_str(trace_part);
    id.push('-');
    id.push_str(span_part);
    id
}

/// Builder for creating Context with more control.
///
/// When an OTel context with a valid span is supplied, trace and span ids are
/// taken from it; otherwise random ids are generated.
pub struct ContextBuilder {
    client_ip: IpAddr,
    otel: Option<opentelemetry::Context>,
    parent_span_id: Option<String>,
    http_version: HttpVersion,
    route: Option<String>,
}

impl ContextBuilder {
    /// Create a new context builder.
    #[inline]
    pub fn new(client_ip: IpAddr) -> Self {
        Self {
            client_ip,
            otel: None,
            parent_span_id: None,
            http_version: HttpVersion::HTTP_11,
            route: None,
        }
    }

    /// Attach the server span context.
    #[inline]
    pub fn otel(mut self, cx: opentelemetry::Context) -> Self {
        self.otel = Some(cx);
        self
    }

    /// Record the upstream parent span, if it was valid.
    #[inline]
    pub fn parent(mut self, parent: &opentelemetry::Context) -> Self {
        let span = parent.span();
        let sc = span.span_context();
        if sc.is_valid() {
            self.parent_span_id = Some(sc.span_id().to_string());
        }
        self
    }

    /// Set the HTTP version.
    #[inline]
    pub fn http_version(mut self, version: HttpVersion) -> Self {
        self.http_version = version;
        self
    }

    /// Set the matched route pattern.
    #[inline]
    pub fn route(mut self, route: Option<String>) -> Self {
        self.route = route;
        self
    }

    /// Build the context.
    pub fn build(self) -> Context {
        let otel = self.otel.unwrap_or_default();
        let (trace_id, span_id) = {
            let span = otel.span();
            let sc = span.span_context();
            if sc.is_valid() {
                (sc.trace_id().to_string(), sc.span_id().to_string())
            } else {
                (generate_trace_id(), generate_span_id())
            }
        };
        let request_id = make_request_id(&trace_id, &span_id);

        Context {
            client_ip: self.client_ip,
            trace_id,
            span_id,
            parent_span_id: self.parent_span_id,
            request_id,
            started_at: Instant::now(),
            http_version: self.http_version,
            route: self.route,
            otel,
            values: HashMap::new(),
        }
    }
}

// ============================================================================
// Fast random ID generation with thread-local state
// ============================================================================

thread_local! {
    static RNG_STATE: Cell<u64> = Cell::new(init_rng_seed());
}

/// Initialize RNG seed from system entropy.
fn init_rng_seed() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::time::{SystemTime, UNIX_EPOCH};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    hasher.write_u64(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64,
    );
    // xorshift must never be seeded with zero
    hasher.finish() | 1
}

/// Fast random u64 using thread-local xorshift64.
#[inline]
fn rand_u64() -> u64 {
    RNG_STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        x
    })
}

/// Generate a random trace ID (32 hex chars).
pub fn generate_trace_id() -> String {
    use std::fmt::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    let mut id = String::with_capacity(32);
    let _ = write!(id, "{:016x}{:016x}", timestamp, rand_u64());
    id
}

/// Generate a random span ID (16 hex chars).
#[inline]
pub fn generate_span_id() -> String {
    use std::fmt::Write;

    let mut id = String::with_capacity(16);
    let _ = write!(id, "{:016x}", rand_u64());
    id
}
