//! The two demo services.
//!
//! Each service is a route table of stub handlers plus the settings its
//! binary needs: name, default port and panic recovery mode.

pub mod nested;
pub mod todo;
pub mod user;

use std::fmt;

use crate::middleware::RecoveryMode;
use crate::server::{Router, RoutingError};

/// Demo service selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Service {
    Todo,
    User,
}

impl Service {
    /// Service name, used as `service.name` and in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Service::Todo => todo::NAME,
            Service::User => user::NAME,
        }
    }

    /// Port used when neither `PORT` nor `LISTEN_ADDR` is set.
    pub fn default_port(self) -> u16 {
        match self {
            Service::Todo => todo::DEFAULT_PORT,
            Service::User => user::DEFAULT_PORT,
        }
    }

    /// How handler panics are answered.
    pub fn recovery(self) -> RecoveryMode {
        match self {
            Service::Todo => RecoveryMode::Plain,
            Service::User => RecoveryMode::Detailed,
        }
    }

    /// Build the service's route table.
    pub fn router(self) -> Result<Router, RoutingError> {
        match self {
            Service::Todo => todo::router(),
            Service::User => user::router(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
