//! Server configuration.
//!
//! All runtime knobs live in [`ServerConfig`], built via its
//! [`ServerConfigBuilder`]. The binary maps CLI flags and environment
//! variables onto the builder; tests construct configs directly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Configuration for the HTTP service.
///
/// Built via [`ServerConfig::builder()`] or using [`ServerConfig::default()`].
///
/// # Example
/// ```rust
/// use markitdown_api::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(9000)
///     .workers(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.bind_address().port(), 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: IpAddr,

    /// TCP port to listen on. Default: 8000.
    pub port: u16,

    /// Number of conversion worker threads. Default: 4.
    ///
    /// Conversions are CPU-bound and blocking; each occupies one worker for
    /// its whole duration. Jobs beyond this count wait in an unbounded queue.
    pub workers: usize,

    /// Maximum accepted request body in bytes. Default: `None` (no limit).
    pub max_upload_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            workers: 4,
            max_upload_bytes: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Socket address the server binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: IpAddr) -> Self {
        self.config.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n;
        self
    }

    pub fn max_upload_bytes(mut self, limit: Option<usize>) -> Self {
        self.config.max_upload_bytes = limit;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let c = &self.config;
        if c.workers == 0 {
            return Err(ConfigError::Invalid("Worker count must be ≥ 1".into()));
        }
        if c.max_upload_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "Upload limit must be ≥ 1 byte when set".into(),
            ));
        }
        Ok(self.config)
    }
}
