//! Configuration module.
//!
//! All settings come from environment variables, captured once into an
//! [`Env`] snapshot and parsed into typed sections.
//!
//! # Example
//!
//! ```rust,ignore
//! use observability_demo::config::Config;
//!
//! let config = Config::from_env("todo", 3001)?;
//! println!("Listen address: {}", config.server.listen_addr);
//! ```

mod error;
mod logging;
mod middleware;
mod parse;
mod server;
mod telemetry;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use middleware::MiddlewareConfig;
pub use parse::Env;
pub use server::ServerConfig;
pub use telemetry::TelemetryConfig;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Middleware configuration.
    pub middleware: MiddlewareConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Trace export configuration.
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env(service_name: &str, default_port: u16) -> Result<Self, ConfigError> {
        Self::load(&Env::process(), service_name, default_port)
    }

    /// Load configuration from an explicit variable snapshot.
    pub fn load(env: &Env, service_name: &str, default_port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(env, default_port)?,
            middleware: MiddlewareConfig::from_env(env)?,
            logging: LoggingConfig::from_env(env, service_name)?,
            telemetry: TelemetryConfig::from_env(env, service_name)?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Service: {}", self.logging.service_name);
        info!("  Listen: {}", self.server.listen_addr);
        info!("  Drain timeout: {}s", self.server.drain_timeout.as_secs());

        if self.telemetry.enabled {
            info!(
                "  Tracing: {} (sampling {})",
                self.telemetry.endpoint, self.telemetry.sampling_ratio
            );
        } else {
            info!("  Tracing: disabled");
        }

        if self.middleware.access_log {
            info!("  Access log: enabled");
        }
    }
}
