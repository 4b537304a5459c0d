//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::parse::Env;
use super::ConfigError;

/// Server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address (`LISTEN_ADDR`, else `0.0.0.0:$PORT`).
    pub listen_addr: SocketAddr,
    /// Graceful shutdown drain timeout.
    pub drain_timeout: Duration,
    /// Header read timeout for HTTP/1 connections.
    pub header_timeout: Duration,
}

impl ServerConfig {
    /// Configuration listening on `addr` with default timeouts.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            drain_timeout: Duration::from_secs(30),
            header_timeout: Duration::from_secs(5),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `default_port` is used when neither `LISTEN_ADDR` nor `PORT` is set.
    pub fn from_env(env: &Env, default_port: u16) -> Result<Self, ConfigError> {
        let listen_addr = match env.opt("LISTEN_ADDR") {
            Some(addr) => addr.parse::<SocketAddr>().map_err(|e| ConfigError::Parse {
                key: "LISTEN_ADDR".into(),
                value: addr.clone(),
                error: e.to_string(),
            })?,
            None => {
                let port: u16 = env.parse("PORT", default_port)?;
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
            }
        };

        let drain_timeout_secs: u64 = env.parse("DRAIN_TIMEOUT_SECS", 30)?;
        let header_timeout_secs: u64 = env.parse("HEADER_TIMEOUT_SECS", 5)?;
        if header_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HEADER_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            listen_addr,
            drain_timeout: Duration::from_secs(drain_timeout_secs),
            header_timeout: Duration::from_secs(header_timeout_secs),
        })
    }
}
