//! Environment variable parsing utilities.

use std::collections::HashMap;
use std::str::FromStr;

use super::ConfigError;

/// Snapshot of the variables configuration is read from.
///
/// Loading goes through this type instead of `std::env` directly so tests can
/// feed a fixed set of variables without touching the process environment.
#[derive(Clone, Debug, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment.
    pub fn process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw lookup (`None` if missing).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Get variable with default value.
    pub fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Get optional variable (None if empty or missing).
    pub fn opt(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Parse variable as boolean.
    /// Treats "1", "true" (case-insensitive) as true and "0", "false" as false.
    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.opt(key) {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    /// Parse variable with type conversion. Missing or empty yields `default`.
    pub fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.opt(key) {
            Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Parse {
                key: key.into(),
                value: v,
                error: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
