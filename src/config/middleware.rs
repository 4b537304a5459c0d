//! Middleware configuration.

use super::parse::Env;
use super::ConfigError;

/// Middleware configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct MiddlewareConfig {
    /// Access logging enabled (ACCESS_LOG, default on).
    pub access_log: bool,
}

impl MiddlewareConfig {
    /// Load configuration from environment variables.
    pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            access_log: env.bool("ACCESS_LOG", true),
        })
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self { access_log: true }
    }
}
