//! OpenTelemetry integration for distributed tracing.
//!
//! Provides W3C Trace Context propagation and OTLP export to
//! collectors like Jaeger, Zipkin, or Datadog.
//!
//! Configuration is read by [`TelemetryConfig`]; see its fields for the
//! environment variables involved.

use std::fmt;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{Config, Sampler, TracerProvider},
    Resource,
};
use tracing::info;

use crate::config::TelemetryConfig;

// Semantic convention keys (avoiding dependency on semconv_experimental feature)
const SERVICE_NAME: &str = "service.name";
const SERVICE_VERSION: &str = "service.version";
const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";

/// Instrumentation scope for spans created by this crate.
pub const TRACER_NAME: &str = "observability_demo";

/// Tracer provider setup and teardown errors.
#[derive(Debug)]
pub enum TelemetryError {
    /// OTLP exporter could not be built.
    Exporter(String),
    /// Flushing or closing the provider failed.
    Shutdown(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Exporter(msg) => write!(f, "failed to build OTLP exporter: {}", msg),
            TelemetryError::Shutdown(msg) => write!(f, "tracer provider shutdown failed: {}", msg),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Installed tracer provider, if tracing is enabled.
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Telemetry with no exporter; the global tracer stays a no-op.
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    /// Check if spans are exported.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// SDK tracer for the `tracing-opentelemetry` bridge layer.
    pub fn tracer(&self) -> Option<opentelemetry_sdk::trace::Tracer> {
        self.provider.as_ref().map(|p| p.tracer(TRACER_NAME))
    }

    /// Log whether spans are exported and where.
    ///
    /// Call once logging is installed; [`init_tracing`] runs before it.
    pub fn log_status(&self, config: &TelemetryConfig) {
        if !self.is_enabled() {
            info!("OpenTelemetry disabled (OTEL_ENABLED=0)");
            return;
        }

        info!(
            endpoint = %config.endpoint,
            service = %config.service_name,
            version = %config.service_version,
            environment = %config.environment,
            sampling = %config.sampling_ratio,
            "OpenTelemetry tracing initialized"
        );
    }

    /// Flush pending spans and close the provider.
    ///
    /// The batch processor blocks while flushing, so this runs on the
    /// blocking pool.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        let Some(provider) = self.provider else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || provider.shutdown())
            .await
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))?
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))?;

        info!("OpenTelemetry tracing shutdown complete");
        Ok(())
    }
}

/// Initialize OpenTelemetry tracing.
///
/// Sets up the OTLP exporter, installs the tracer provider and the W3C
/// propagator globally. Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built.
pub fn init_tracing(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    if !config.enabled {
        return Ok(Telemetry::disabled());
    }

    // Build resource with service attributes
    let resource = Resource::new([
        KeyValue::new(SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(SERVICE_VERSION, config.service_version.clone()),
        KeyValue::new(DEPLOYMENT_ENVIRONMENT, config.environment.clone()),
    ]);

    // Configure OTLP exporter
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .with_timeout(config.export_timeout)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    // Build tracer provider with batching
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            Config::default()
                .with_resource(resource)
                .with_sampler(Sampler::TraceIdRatioBased(config.sampling_ratio)),
        )
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    Ok(Telemetry {
        provider: Some(provider),
    })
}
