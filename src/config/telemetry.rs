//! OpenTelemetry configuration.

use std::time::Duration;

use super::parse::Env;
use super::ConfigError;

/// Default OTLP gRPC collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4317";

/// Tracing export configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Whether spans are exported at all (OTEL_ENABLED).
    pub enabled: bool,
    /// OTLP endpoint (e.g., "http://jaeger:4317")
    pub endpoint: String,
    /// Service name
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Deployment environment (dev, staging, production)
    pub environment: String,
    /// Sampling ratio (0.0 - 1.0, 1.0 = sample all)
    pub sampling_ratio: f64,
    /// Export timeout
    pub export_timeout: Duration,
}

impl TelemetryConfig {
    /// Disabled configuration for the given service.
    pub fn disabled(service_name: &str) -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_ENDPOINT.into(),
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").into(),
            environment: "dev".into(),
            sampling_ratio: 1.0,
            export_timeout: Duration::from_secs(10),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// The endpoint is taken from `JEAGER_ENDPOINT`, then
    /// `OTEL_EXPORTER_OTLP_ENDPOINT`, then the local collector default.
    pub fn from_env(env: &Env, service_name: &str) -> Result<Self, ConfigError> {
        let endpoint = env
            .opt("JEAGER_ENDPOINT")
            .or_else(|| env.opt("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into());

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "JEAGER_ENDPOINT".into(),
                message: format!("endpoint '{}' must be an http(s) URL", endpoint),
            });
        }

        let sampling_ratio: f64 = env.parse("OTEL_SAMPLING_RATIO", 1.0)?;
        if !(0.0..=1.0).contains(&sampling_ratio) {
            return Err(ConfigError::Invalid {
                key: "OTEL_SAMPLING_RATIO".into(),
                message: format!("{} is outside 0.0..=1.0", sampling_ratio),
            });
        }

        let export_timeout_secs: u64 = env.parse("OTEL_EXPORT_TIMEOUT", 10)?;

        Ok(Self {
            enabled: env.bool("OTEL_ENABLED", true),
            endpoint,
            service_name: env.or("OTEL_SERVICE_NAME", service_name),
            service_version: env.or("OTEL_SERVICE_VERSION", env!("CARGO_PKG_VERSION")),
            environment: env.or("OTEL_ENVIRONMENT", "dev"),
            sampling_ratio,
            export_timeout: Duration::from_secs(export_timeout_secs),
        })
    }
}
