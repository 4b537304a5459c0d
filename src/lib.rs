//! observability_demo - Two stub HTTP services wired for distributed tracing.
//!
//! The `todo` and `user` binaries answer fixed JSON messages. Around those
//! stubs sits the instrumentation the crate exists to show: a server span per
//! request, W3C trace context propagation, nested spans across tasks, JSON
//! logs correlated with trace ids and graceful shutdown.
//!
//! # Features
//!
//! - **Tracing**: OpenTelemetry spans exported over OTLP
//! - **Middleware Pipeline**: Access log, trace headers, panic recovery
//! - **Structured Logging**: One JSON object per line with trace correlation
//! - **Graceful Shutdown**: SIGINT / SIGTERM, connection draining
//!
//! # Example
//!
//! ```rust,ignore
//! use observability_demo::app;
//! use observability_demo::services::Service;
//!
//! app::run(Service::User)?;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod config;
pub mod core;
pub mod logging;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use config::Config;
pub use server::{Router, Server};
pub use services::Service;
