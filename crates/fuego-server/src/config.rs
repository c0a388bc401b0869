//! Server and service configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use fuego_core::{ConfigError, ProverConfig};
use serde::{Deserialize, Serialize};

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
    /// In-flight request cap for routes that reach the daemon
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// How long a request may wait for a slot before it is shed with 503
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,
}

fn default_addr() -> SocketAddr {
    ([0, 0, 0, 0], 8080).into()
}

fn default_max_concurrent_requests() -> usize {
    256
}

fn default_queue_timeout_ms() -> u64 {
    5_000
}

impl ServerConfig {
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid("max_concurrent_requests must be positive".into()));
        }
        if self.queue_timeout_ms == 0 {
            return Err(ConfigError::Invalid("queue_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            max_concurrent_requests: default_max_concurrent_requests(),
            queue_timeout_ms: default_queue_timeout_ms(),
        }
    }
}

/// Everything a `--config` file may carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ServiceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prover.validate()?;
        self.server.validate()
    }
}
