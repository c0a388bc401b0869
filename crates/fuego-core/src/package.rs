//! Verifier-facing proof package

use serde::{Deserialize, Serialize};

use crate::confirmations::is_final;
use crate::extra::Commitment;
use crate::hash::{hex_bytes, Hash32};
use crate::merkle::{compute_root, MerkleHash, MerkleProof, PathStep};
use crate::types::{BlockHeader, BlockRecord, TransactionRecord};

/// Everything a destination-chain verifier needs to check that a burn
/// transaction is included in a Fuego block.
///
/// Field names and encodings are consumed bit-exact by the on-chain
/// verifier. A package can only be built from fully fetched parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPackage {
    tx_hash: Hash32,
    #[serde(with = "hex_bytes")]
    tx_data: Vec<u8>,
    block_header: BlockHeader,
    merkle_proof: Vec<PathStep>,
    amount: u64,
    block_height: u64,
    commitment: Commitment,
    timestamp: u64,
    confirmations: u64,
}

impl ProofPackage {
    pub fn new(
        tx: TransactionRecord,
        block: BlockRecord,
        proof: MerkleProof,
        commitment: Commitment,
        confirmations: u64,
    ) -> Self {
        Self {
            tx_hash: tx.hash,
            tx_data: tx.raw_data,
            block_header: block.header,
            merkle_proof: proof.path,
            amount: tx.amount,
            block_height: tx.block_height,
            commitment,
            timestamp: tx.timestamp,
            confirmations,
        }
    }

    pub fn tx_hash(&self) -> &Hash32 {
        &self.tx_hash
    }

    pub fn tx_data(&self) -> &[u8] {
        &self.tx_data
    }

    pub fn block_header(&self) -> &BlockHeader {
        &self.block_header
    }

    pub fn merkle_proof(&self) -> &[PathStep] {
        &self.merkle_proof
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn confirmations(&self) -> u64 {
        self.confirmations
    }

    pub fn is_final(&self, threshold: u64) -> bool {
        is_final(self.confirmations, threshold)
    }

    /// Recompute the root from `tx_hash` and compare with the header
    pub fn verify_inclusion(&self, hasher: MerkleHash) -> bool {
        compute_root(&self.tx_hash, &self.merkle_proof, hasher) == self.block_header.merkle_root
    }
}
