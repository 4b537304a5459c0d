//! Nested span example.
//!
//! `parent` opens a `Parent` span and fans out two `child` operations under
//! the caller's context, so both `Child` spans are siblings of `Parent`. Each
//! child waits in a background task, signals the parent over its own oneshot
//! channel, then finishes its span. `parent` returns once both signals have
//! arrived.

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::{Context, KeyValue};
use tokio::sync::oneshot;

/// Tracer name the example spans are recorded under.
pub const TRACER_NAME: &str = "nested";

/// Waits of the two children.
pub const CHILD_WAITS: [Duration; 2] = [Duration::from_millis(300), Duration::from_millis(600)];

/// Run the example under `cx` using the global tracer provider.
pub async fn parent(cx: &Context) {
    parent_in(&global::tracer(TRACER_NAME), cx).await
}

/// Run the example with an explicit tracer.
pub async fn parent_in<T>(tracer: &T, cx: &Context)
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    let mut span = tracer.start_with_context("Parent", cx);

    let mut pending = Vec::with_capacity(CHILD_WAITS.len());
    for wait in CHILD_WAITS {
        let (signal, done) = oneshot::channel();
        child_in(tracer, cx, wait, signal);
        pending.push(done);
    }

    for done in pending {
        // A dropped sender means the child task is gone; stop waiting on it
        let _ = done.await;
    }

    span.end();
}

/// Start one child under `cx` using the global tracer provider.
pub fn child(cx: &Context, wait: Duration, signal: oneshot::Sender<()>) {
    child_in(&global::tracer(TRACER_NAME), cx, wait, signal)
}

/// Start a `Child` span and finish it from a background task after `wait`.
///
/// Returns immediately. Must be called from within a Tokio runtime.
pub fn child_in<T>(tracer: &T, cx: &Context, wait: Duration, signal: oneshot::Sender<()>)
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    let mut span = tracer.start_with_context("Child", cx);
    span.set_attribute(KeyValue::new("child.wait_ms", wait.as_millis() as i64));

    tokio::spawn(async move {
        tokio::time::sleep(wait).await;
        let _ = signal.send(());
        span.end();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{TraceContextExt, TracerProvider as _};
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use opentelemetry_sdk::trace::TracerProvider;
    use std::time::Instant;

    fn provider() -> (TracerProvider, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (provider, exporter)
    }

    #[tokio::test]
    async fn test_parent_waits_for_both_children() {
        let (provider, _exporter) = provider();
        let tracer = provider.tracer(TRACER_NAME);

        let start = Instant::now();
        parent_in(&tracer, &Context::new()).await;

        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_span_tree() {
        let (provider, exporter) = provider();
        let tracer = provider.tracer(TRACER_NAME);

        let request = tracer.start("request");
        let request_cx = Context::new().with_span(request);
        parent_in(&tracer, &request_cx).await;

        let request = request_cx.span().span_context().clone();
        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 3);

        let parent = spans.iter().find(|s| s.name == "Parent").unwrap();
        assert_eq!(parent.parent_span_id, request.span_id());

        // Children are siblings of Parent, not its descendants
        let children: Vec<_> = spans.iter().filter(|s| s.name == "Child").collect();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.parent_span_id, request.span_id());
            assert_ne!(child.parent_span_id, parent.span_context.span_id());
            assert_eq!(child.span_context.trace_id(), request.trace_id());
        }

        // Parent ends after both signals, so it outlives every child
        for child in &children {
            assert!(parent.end_time >= child.end_time);
        }

        let mut waits: Vec<_> = children
            .iter()
            .flat_map(|c| c.attributes.iter())
            .filter(|kv| kv.key.as_str() == "child.wait_ms")
            .map(|kv| kv.value.to_string())
            .collect();
        waits.sort();
        assert_eq!(waits, vec!["300", "600"]);
    }

    #[tokio::test]
    async fn test_child_returns_immediately() {
        let (signal, done) = oneshot::channel();

        let start = Instant::now();
        child(&Context::new(), Duration::from_millis(50), signal);
        assert!(start.elapsed() < Duration::from_millis(50));

        assert_eq!(done.await, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
