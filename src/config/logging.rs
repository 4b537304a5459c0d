//! Logging configuration.

use super::parse::Env;
use super::ConfigError;

/// Crate target used in default filters.
const CRATE_TARGET: &str = "observability_demo";

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Output format (LOG_FORMAT).
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: observability_demo=debug,hyper=warn
    pub fn from_env(env: &Env, service_name: &str) -> Result<Self, ConfigError> {
        let format = match env.or("LOG_FORMAT", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT".into(),
                    message: format!("expected json or pretty, got '{}'", other),
                })
            }
        };

        Ok(Self {
            filter: resolve_log_filter(env),
            service_name: service_name.to_string(),
            format,
        })
    }
}

/// Resolve log filter.
///
/// Priority: LOG_LEVEL > RUST_LOG > default (info)
fn resolve_log_filter(env: &Env) -> String {
    if let Some(level) = env.opt("LOG_LEVEL") {
        let level = level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                return format!("{}={}", CRATE_TARGET, level);
            }
            _ => {
                // Logging is not installed yet.
                eprintln!(
                    "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                    level
                );
            }
        }
    }

    if let Some(filter) = env.opt("RUST_LOG") {
        return filter;
    }

    format!("{}=info,access=info", CRATE_TARGET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_priority() {
        assert_eq!(
            resolve_log_filter(&Env::default()),
            "observability_demo=info,access=info"
        );

        let env = Env::from_pairs([("RUST_LOG", "observability_demo=warn,hyper=debug")]);
        assert_eq!(resolve_log_filter(&env), "observability_demo=warn,hyper=debug");

        let env = Env::from_pairs([
            ("RUST_LOG", "observability_demo=warn,hyper=debug"),
            ("LOG_LEVEL", "DEBUG"),
        ]);
        assert_eq!(resolve_log_filter(&env), "observability_demo=debug");

        let env = Env::from_pairs([("LOG_LEVEL", "loud"), ("RUST_LOG", "warn")]);
        assert_eq!(resolve_log_filter(&env), "warn");
    }

    #[test]
    fn test_log_format() {
        let config = LoggingConfig::from_env(&Env::default(), "todo").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.service_name, "todo");

        let env = Env::from_pairs([("LOG_FORMAT", "Pretty")]);
        let config = LoggingConfig::from_env(&env, "todo").unwrap();
        assert_eq!(config.format, LogFormat::Pretty);

        let env = Env::from_pairs([("LOG_FORMAT", "xml")]);
        assert!(LoggingConfig::from_env(&env, "todo").is_err());
    }
}
