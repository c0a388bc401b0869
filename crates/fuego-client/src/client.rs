//! HTTP client for the proof server

use std::time::Duration;

use fuego_core::{BlockHeader, Hash32, ProofPackage};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// `GET /status` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChainStatus {
    Online {
        height: u64,
        #[serde(default)]
        difficulty: Option<u64>,
        #[serde(default)]
        version: Option<String>,
    },
    Offline {
        error: String,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a running `fuego-proof-server`
pub struct ProofClient {
    http: Client,
    server_url: String,
}

impl ProofClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(server_url, Duration::from_secs(30))
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Fetch the proof package for `tx_hash`
    pub async fn proof(&self, tx_hash: &Hash32) -> Result<ProofPackage> {
        tracing::debug!(tx_hash = %tx_hash, "Requesting proof");
        self.get(&format!("/proof/{}", tx_hash)).await
    }

    pub async fn status(&self) -> Result<ChainStatus> {
        self.get("/status").await
    }

    pub async fn block_header(&self, height: u64) -> Result<BlockHeader> {
        self.get(&format!("/block/{}", height)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.server_url, path);
        let resp = self.http.get(&url).send().await?;
        let resp = check_status(resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-2xx response into [`ClientError::Server`] carrying its `{error}` message
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}
