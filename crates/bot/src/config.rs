//! Configuration loaded from environment variables.

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

/// Default port for the status server.
pub const DEFAULT_PORT: u16 = 8080;

/// Process-level configuration not owned by any library crate.
#[derive(Debug, Clone)]
pub struct Config {
    /// Status server bind address.
    pub status_addr: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PORT` | Status server port, bound on all interfaces | `8080` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            status_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}
