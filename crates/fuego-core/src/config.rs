//! Prover configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::confirmations::DEFAULT_FINALITY_THRESHOLD;
use crate::error::ConfigError;
use crate::extra::{TAG_HEAT_COMMITMENT, TAG_PADDING, TAG_PUBKEY};
use crate::merkle::MerkleHash;

/// Configuration shared by the gateway, cache and assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Fuego daemon JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Upper bound for every daemon call
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Lifetime of cached transactions and blocks
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Expired-entry sweep period; 0.8 x TTL when unset
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
    /// Advisory confirmation depth for finality
    #[serde(default = "default_finality_threshold")]
    pub finality_threshold: u64,
    /// Must match the destination-chain verifier
    #[serde(default)]
    pub merkle_hash: MerkleHash,
    /// `tx_extra` tag holding the commitment
    #[serde(default = "default_commitment_tag")]
    pub commitment_tag: u8,
}

fn default_rpc_url() -> String {
    "http://localhost:18180/json_rpc".to_string()
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_finality_threshold() -> u64 {
    DEFAULT_FINALITY_THRESHOLD
}

fn default_commitment_tag() -> u8 {
    TAG_HEAT_COMMITMENT
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: None,
            finality_threshold: default_finality_threshold(),
            merkle_hash: MerkleHash::default(),
            commitment_tag: default_commitment_tag(),
        }
    }
}

impl ProverConfig {
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_merkle_hash(mut self, hash: MerkleHash) -> Self {
        self.merkle_hash = hash;
        self
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        match self.sweep_interval_secs {
            Some(secs) => Duration::from_secs(secs.max(1)),
            None => self.cache_ttl().mul_f64(0.8).max(Duration::from_secs(1)),
        }
    }

    /// Reject values that would make the pipeline unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.is_empty() {
            return Err(ConfigError::Invalid("rpc_url is empty".into()));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(ConfigError::Invalid("rpc_timeout_ms must be positive".into()));
        }
        if matches!(self.commitment_tag, TAG_PADDING | TAG_PUBKEY) {
            return Err(ConfigError::Invalid(format!(
                "commitment_tag 0x{:02x} collides with a fixed-layout tag",
                self.commitment_tag
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
