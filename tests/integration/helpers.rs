//! Test helpers and utilities

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use observability_demo::config::ServerConfig;
use observability_demo::middleware::RecoveryMode;
use observability_demo::server::{Router, Server};
use observability_demo::services::Service;
use opentelemetry::trace::{TraceId, TracerProvider as _};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use reqwest::{Client, Method, Response, StatusCode};
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;

/// In-process server on an ephemeral port
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub client: Client,
    pub server: Arc<Server>,
    accept_loop: Option<JoinHandle<observability_demo::core::Result<()>>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Start one of the demo services
    pub async fn start(service: Service) -> Self {
        let router = service.router().expect("Service routes should build");
        Self::with_router(router, service.recovery()).await
    }

    /// Start a server with a custom route table
    pub async fn with_router(router: Router, recovery: RecoveryMode) -> Self {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Arc::new(
            Server::new(config, router)
                .with_recovery(recovery)
                .with_access_log(false),
        );

        let listener = server.bind().expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let accept_loop = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.serve(listener).await }
        });

        // Redirects are asserted, not followed
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", addr),
            addr,
            client,
            server,
            accept_loop: Some(accept_loop),
        }
    }

    /// Make a GET request to the server
    pub async fn get(&self, path: &str) -> Response {
        self.request(Method::GET, path).await
    }

    /// Make a request with any method
    pub async fn request(&self, method: Method, path: &str) -> Response {
        self.client
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{} {} failed: {}", method, path, e))
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> Response {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.send().await.expect("GET request failed")
    }

    /// Trigger shutdown and wait for the accept loop to exit
    pub async fn stop_accepting(&mut self) {
        self.server.trigger_shutdown();
        if let Some(handle) = self.accept_loop.take() {
            handle
                .await
                .expect("Accept loop panicked")
                .expect("Accept loop failed");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.trigger_shutdown();
    }
}

/// Install a global tracer provider backed by an in-memory exporter, plus a
/// `tracing` subscriber bridging spans into it.
///
/// Installed once per test binary. Other tests keep running against it, so
/// callers filter exported spans by trace id.
pub fn span_exporter() -> InMemorySpanExporter {
    static EXPORTER: OnceLock<InMemorySpanExporter> = OnceLock::new();

    EXPORTER
        .get_or_init(|| {
            let exporter = InMemorySpanExporter::default();
            let provider = TracerProvider::builder()
                .with_simple_exporter(exporter.clone())
                .build();

            let subscriber = tracing_subscriber::registry()
                .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("integration")));
            tracing::subscriber::set_global_default(subscriber)
                .expect("Global subscriber already installed");
            opentelemetry::global::set_tracer_provider(provider);

            exporter
        })
        .clone()
}

/// Wait until at least `count` finished spans belong to `trace_id`
pub async fn finished_spans(
    exporter: &InMemorySpanExporter,
    trace_id: &str,
    count: usize,
) -> Vec<SpanData> {
    let trace_id = TraceId::from_hex(trace_id).expect("Invalid trace id");

    for _ in 0..50 {
        let spans: Vec<SpanData> = exporter
            .get_finished_spans()
            .expect("Exporter lock poisoned")
            .into_iter()
            .filter(|s| s.span_context.trace_id() == trace_id)
            .collect();
        if spans.len() >= count {
            return spans;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Expected {} finished spans for trace {}", count, trace_id);
}

/// Find exactly one span by name
pub fn span_named<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    let mut found = spans.iter().filter(|s| s.name == name);
    let span = found
        .next()
        .unwrap_or_else(|| panic!("No span named '{}'", name));
    assert!(found.next().is_none(), "More than one span named '{}'", name);
    span
}

/// Assert that response has expected status
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that a header has the expected value
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .expect("Header is not valid UTF-8");
    assert_eq!(value, expected, "Header '{}' mismatch", name);
}

/// Get a header value as string
pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Read the `message` field of a JSON body
pub async fn message(response: Response) -> String {
    assert_header(&response, "content-type", "application/json; charset=utf-8");
    let body: serde_json::Value = response.json().await.expect("Body is not JSON");
    body["message"]
        .as_str()
        .expect("Body has no message field")
        .to_string()
}

/// Assert a `200 OK` with `{"message": expected}`
pub async fn assert_message(response: Response, expected: &str) {
    assert_status(&response, StatusCode::OK);
    assert_eq!(message(response).await, expected);
}
