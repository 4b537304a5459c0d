//! Observability module: tracer provider bootstrap and request tracing.
//!
//! # Features
//!
//! - **OpenTelemetry Tracing**: OTLP export with W3C Trace Context propagation
//! - **HTTP spans**: one server span per request with semantic-convention attributes
//!
//! Log correlation lives in [`crate::logging`], which bridges `tracing` spans
//! into the provider installed here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use observability_demo::config::TelemetryConfig;
//! use observability_demo::observability::init_tracing;
//!
//! let telemetry = init_tracing(&config.telemetry)?;
//! logging::init(&config.logging, telemetry.tracer())?;
//! telemetry.log_status(&config.telemetry);
//!
//! // ... run server ...
//!
//! telemetry.shutdown().await?;
//! ```

pub mod otel;
pub mod tracing_middleware;

pub use otel::{init_tracing, Telemetry, TelemetryError, TRACER_NAME};
