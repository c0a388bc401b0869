//! JSON-RPC gateway to the Fuego daemon

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use fuego_core::{
    decode_hex, BlockHeader, BlockRecord, ChainInfo, Hash32, ProofError, ProverConfig,
    TransactionRecord,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::metrics;

pub const METHOD_GET_TRANSACTIONS: &str = "gettransactions";
pub const METHOD_GET_BLOCK: &str = "getblock";
pub const METHOD_GET_BLOCK_HEADER: &str = "getblockheaderbyheight";
pub const METHOD_GET_BLOCK_COUNT: &str = "getblockcount";
pub const METHOD_GET_INFO: &str = "getinfo";

/// Read-only view of the source chain.
///
/// Each call maps to exactly one upstream request. Implementations must be
/// shareable across concurrent proof requests.
pub trait ChainGateway: Send + Sync {
    fn get_transaction(
        &self,
        hash: Hash32,
    ) -> impl Future<Output = Result<TransactionRecord, ProofError>> + Send;

    fn get_block(&self, height: u64) -> impl Future<Output = Result<BlockRecord, ProofError>> + Send;

    fn get_block_header(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<BlockHeader, ProofError>> + Send;

    fn get_chain_height(&self) -> impl Future<Output = Result<u64, ProofError>> + Send;

    fn get_info(&self) -> impl Future<Output = Result<ChainInfo, ProofError>> + Send;
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct GetTransactionsParams {
    txs_hashes: Vec<String>,
    decode_as_json: bool,
}

#[derive(Serialize)]
struct HeightParams {
    height: u64,
}

#[derive(Deserialize)]
struct GetTransactionsResult {
    #[serde(default)]
    txs: Vec<RpcTransaction>,
    #[serde(default)]
    missed_tx: Vec<String>,
}

#[derive(Deserialize)]
struct RpcTransaction {
    #[serde(default)]
    tx_hash: Option<String>,
    as_hex: String,
    #[serde(default)]
    as_json: Option<String>,
    #[serde(default)]
    block_height: u64,
    #[serde(default)]
    block_timestamp: u64,
    #[serde(default)]
    in_pool: bool,
}

/// Subset of the decoded transaction carried in `as_json`
#[derive(Deserialize)]
struct DecodedTransaction {
    #[serde(default)]
    extra: Vec<u8>,
    #[serde(default)]
    vout: Vec<DecodedOutput>,
}

#[derive(Deserialize)]
struct DecodedOutput {
    #[serde(default)]
    amount: u64,
}

#[derive(Deserialize)]
struct RpcBlockHeader {
    hash: String,
    height: u64,
    #[serde(default, alias = "tree_root_hash")]
    merkle_root: Option<String>,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    prev_hash: Option<String>,
    #[serde(default)]
    major_version: Option<u8>,
    #[serde(default)]
    minor_version: Option<u8>,
    #[serde(default)]
    nonce: Option<u64>,
    #[serde(default)]
    difficulty: Option<u64>,
    #[serde(default)]
    reward: Option<u64>,
    #[serde(default)]
    depth: Option<u64>,
    #[serde(default)]
    orphan_status: Option<bool>,
}

#[derive(Deserialize)]
struct GetBlockResult {
    block_header: RpcBlockHeader,
    #[serde(default)]
    miner_tx_hash: Option<String>,
    #[serde(default)]
    tx_hashes: Vec<String>,
}

#[derive(Deserialize)]
struct GetBlockHeaderResult {
    block_header: RpcBlockHeader,
}

#[derive(Deserialize)]
struct GetBlockCountResult {
    count: u64,
}

#[derive(Deserialize)]
struct GetInfoResult {
    height: u64,
    #[serde(default)]
    difficulty: Option<u64>,
    #[serde(default)]
    tx_count: Option<u64>,
    #[serde(default)]
    tx_pool_size: Option<u64>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    top_block_hash: Option<String>,
}

fn parse_hash(field: &str, value: &str) -> Result<Hash32, ProofError> {
    value
        .parse()
        .map_err(|e| ProofError::Decode(format!("{}: {}", field, e)))
}

impl TryFrom<RpcBlockHeader> for BlockHeader {
    type Error = ProofError;

    fn try_from(raw: RpcBlockHeader) -> Result<Self, Self::Error> {
        let merkle_root = raw.merkle_root.as_deref().ok_or_else(|| {
            ProofError::Decode(format!("block {} header lacks merkle_root", raw.height))
        })?;
        Ok(BlockHeader {
            hash: parse_hash("block_header.hash", &raw.hash)?,
            height: raw.height,
            merkle_root: parse_hash("block_header.merkle_root", merkle_root)?,
            timestamp: raw.timestamp,
            prev_hash: raw
                .prev_hash
                .as_deref()
                .map(|h| parse_hash("block_header.prev_hash", h))
                .transpose()?,
            major_version: raw.major_version,
            minor_version: raw.minor_version,
            nonce: raw.nonce,
            difficulty: raw.difficulty,
            reward: raw.reward,
            depth: raw.depth,
            orphan_status: raw.orphan_status,
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> ProofError {
    if err.is_timeout() {
        ProofError::Network(format!("request timed out: {}", err))
    } else if err.is_decode() {
        ProofError::Decode(err.to_string())
    } else {
        ProofError::Network(err.to_string())
    }
}

/// HTTP JSON-RPC client for the Fuego daemon
#[derive(Debug)]
pub struct FuegoRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl FuegoRpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, ProofError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProofError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &ProverConfig) -> Result<Self, ProofError> {
        Self::new(config.rpc_url.clone(), config.rpc_timeout())
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// One JSON-RPC round trip; `Ok(None)` when the daemon returns no result
    async fn call<P, R>(&self, method: &str, params: P) -> Result<Option<R>, ProofError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let result = self.call_inner(method, params).await;
        let elapsed = start.elapsed();

        metrics::record_rpc(method, &result, elapsed);
        debug!(
            method,
            elapsed_ms = elapsed.as_millis() as u64,
            ok = result.is_ok(),
            "Fuego RPC call"
        );
        result
    }

    async fn call_inner<P, R>(&self, method: &str, params: P) -> Result<Option<R>, ProofError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        let envelope: Option<RpcEnvelope> = serde_json::from_slice(&body).ok();

        let envelope = match envelope {
            Some(env) => env,
            None if !status.is_success() => {
                return Err(ProofError::Network(format!("{} returned HTTP {}", method, status)));
            }
            None => {
                return Err(ProofError::Decode(format!("{}: response is not a JSON-RPC envelope", method)));
            }
        };

        if let Some(err) = envelope.error {
            return Err(ProofError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        if !status.is_success() {
            return Err(ProofError::Network(format!("{} returned HTTP {}", method, status)));
        }

        let result = match envelope.result {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        if let Some(daemon_status) = result.get("status").and_then(Value::as_str) {
            if daemon_status != "OK" {
                return Err(ProofError::Rpc {
                    code: None,
                    message: format!("{} status: {}", method, daemon_status),
                });
            }
        }

        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| ProofError::Decode(format!("{}: {}", method, e)))
    }
}

impl ChainGateway for FuegoRpcClient {
    async fn get_transaction(&self, hash: Hash32) -> Result<TransactionRecord, ProofError> {
        let params = GetTransactionsParams {
            txs_hashes: vec![hash.to_string()],
            decode_as_json: true,
        };
        let not_found = || ProofError::NotFound(format!("transaction {}", hash));

        let result: GetTransactionsResult = self
            .call(METHOD_GET_TRANSACTIONS, params)
            .await?
            .ok_or_else(not_found)?;

        if result.missed_tx.iter().any(|missed| missed.eq_ignore_ascii_case(&hash.to_string())) {
            return Err(not_found());
        }
        let tx = result.txs.into_iter().next().ok_or_else(not_found)?;

        if let Some(returned) = tx.tx_hash.as_deref() {
            if parse_hash("tx_hash", returned)? != hash {
                return Err(ProofError::Decode(format!(
                    "asked for transaction {}, daemon returned {}",
                    hash, returned
                )));
            }
        }
        if tx.in_pool {
            return Err(ProofError::NotFound(format!("transaction {} is not yet mined", hash)));
        }

        let raw_data = decode_hex(&tx.as_hex).map_err(|e| ProofError::Decode(format!("as_hex: {}", e)))?;
        let decoded: DecodedTransaction = match tx.as_json.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| ProofError::Decode(format!("as_json: {}", e)))?,
            None => DecodedTransaction { extra: Vec::new(), vout: Vec::new() },
        };

        let amount = decoded
            .vout
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.amount))
            .ok_or_else(|| ProofError::Decode(format!("output amounts of {} overflow", hash)))?;

        Ok(TransactionRecord {
            hash,
            raw_data,
            extra: decoded.extra,
            amount,
            block_height: tx.block_height,
            timestamp: tx.block_timestamp,
        })
    }

    async fn get_block(&self, height: u64) -> Result<BlockRecord, ProofError> {
        let result: GetBlockResult = self
            .call(METHOD_GET_BLOCK, HeightParams { height })
            .await?
            .ok_or_else(|| ProofError::NotFound(format!("block at height {}", height)))?;

        let header = BlockHeader::try_from(result.block_header)?;
        if header.height != height {
            return Err(ProofError::Decode(format!(
                "asked for block {}, daemon returned {}",
                height, header.height
            )));
        }

        let mut tx_hashes = Vec::with_capacity(result.tx_hashes.len() + 1);
        if let Some(miner) = result.miner_tx_hash.as_deref() {
            tx_hashes.push(parse_hash("miner_tx_hash", miner)?);
        }
        for hash in &result.tx_hashes {
            tx_hashes.push(parse_hash("tx_hashes", hash)?);
        }

        Ok(BlockRecord { height, header, tx_hashes })
    }

    async fn get_block_header(&self, height: u64) -> Result<BlockHeader, ProofError> {
        let result: GetBlockHeaderResult = self
            .call(METHOD_GET_BLOCK_HEADER, HeightParams { height })
            .await?
            .ok_or_else(|| ProofError::NotFound(format!("block at height {}", height)))?;
        BlockHeader::try_from(result.block_header)
    }

    async fn get_chain_height(&self) -> Result<u64, ProofError> {
        let result: GetBlockCountResult = self
            .call(METHOD_GET_BLOCK_COUNT, Value::Object(Default::default()))
            .await?
            .ok_or_else(|| ProofError::Decode("getblockcount returned no result".into()))?;
        Ok(result.count)
    }

    async fn get_info(&self) -> Result<ChainInfo, ProofError> {
        let result: GetInfoResult = self
            .call(METHOD_GET_INFO, Value::Object(Default::default()))
            .await?
            .ok_or_else(|| ProofError::Decode("getinfo returned no result".into()))?;

        Ok(ChainInfo {
            height: result.height,
            difficulty: result.difficulty,
            tx_count: result.tx_count,
            tx_pool_size: result.tx_pool_size,
            version: result.version,
            top_block_hash: result
                .top_block_hash
                .as_deref()
                .map(|h| parse_hash("top_block_hash", h))
                .transpose()?,
        })
    }
}
