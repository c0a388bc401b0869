//! Records fetched from the Fuego daemon

use serde::{Deserialize, Serialize};

use crate::hash::{hex_bytes, Hash32};

/// A mined transaction as reported by `gettransactions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: Hash32,
    /// Serialized transaction (`as_hex`)
    #[serde(with = "hex_bytes")]
    pub raw_data: Vec<u8>,
    /// `tx_extra` blob carrying tagged metadata
    #[serde(with = "hex_bytes")]
    pub extra: Vec<u8>,
    /// Sum of output amounts in atomic units
    pub amount: u64,
    pub block_height: u64,
    /// Block timestamp, seconds
    pub timestamp: u64,
}

/// Block header fields relevant to inclusion proofs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub hash: Hash32,
    pub height: u64,
    /// Root over the block's ordered transaction hashes
    pub merkle_root: Hash32,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<Hash32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orphan_status: Option<bool>,
}

impl BlockHeader {
    /// Header with only the mandatory fields set
    pub fn new(hash: Hash32, height: u64, merkle_root: Hash32, timestamp: u64) -> Self {
        Self {
            hash,
            height,
            merkle_root,
            timestamp,
            prev_hash: None,
            major_version: None,
            minor_version: None,
            nonce: None,
            difficulty: None,
            reward: None,
            depth: None,
            orphan_status: None,
        }
    }
}

/// A block with its transaction hashes in canonical order.
///
/// The order of `tx_hashes` defines Merkle leaf indices and is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub height: u64,
    pub header: BlockHeader,
    pub tx_hashes: Vec<Hash32>,
}

/// Daemon status summary from `getinfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub height: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_pool_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_block_hash: Option<Hash32>,
}
