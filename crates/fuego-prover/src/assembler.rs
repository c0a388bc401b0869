//! Proof package pipeline

use std::time::Duration;

use fuego_core::{
    BlockRecord, CommitmentExtractor, ConfirmationPolicy, Hash32, MerkleHash, MerkleProof,
    MerkleProofBuilder, ProofError, ProofPackage, ProverConfig,
};
use tracing::{debug, info, warn};

use crate::cached::{CacheSweeper, CachedGateway};
use crate::metrics;
use crate::rpc::ChainGateway;

/// Builds proof packages for burn transactions.
///
/// Steps run strictly in order: transaction, block, Merkle proof, commitment,
/// confirmations. The first failure aborts with that step's error. The only
/// retry is a single uncached block refetch when the Merkle root does not
/// match.
pub struct ProofAssembler<G> {
    gateway: CachedGateway<G>,
    merkle: MerkleProofBuilder,
    extractor: CommitmentExtractor,
    policy: ConfirmationPolicy,
    sweep_interval: Duration,
}

impl<G: ChainGateway> ProofAssembler<G> {
    pub fn new(gateway: G, config: &ProverConfig) -> Self {
        Self {
            gateway: CachedGateway::new(gateway, config.cache_ttl()),
            merkle: MerkleProofBuilder::new(config.merkle_hash),
            extractor: CommitmentExtractor::new(config.commitment_tag),
            policy: ConfirmationPolicy::new(config.finality_threshold),
            sweep_interval: config.sweep_interval(),
        }
    }

    pub fn gateway(&self) -> &CachedGateway<G> {
        &self.gateway
    }

    pub fn merkle_hash(&self) -> MerkleHash {
        self.merkle.hasher()
    }

    pub fn extractor(&self) -> &CommitmentExtractor {
        &self.extractor
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Start the configured background cache sweeps
    pub fn spawn_sweepers(&self) -> CacheSweeper {
        self.gateway.spawn_sweepers(self.sweep_interval)
    }

    pub async fn assemble(&self, tx_hash: Hash32) -> Result<ProofPackage, ProofError> {
        let tx = self.gateway.get_transaction(tx_hash).await?;
        debug!(tx_hash = %tx_hash, height = tx.block_height, "Fetched transaction");

        let block = self.gateway.get_block(tx.block_height).await?;
        debug!(tx_hash = %tx_hash, height = block.height, leaves = block.tx_hashes.len(), "Fetched block");

        let (block, proof) = self.prove_inclusion(&tx_hash, block).await?;
        debug!(tx_hash = %tx_hash, leaf_index = proof.leaf_index, depth = proof.path.len(), "Built Merkle proof");

        let commitment = self.extractor.extract(&tx.extra)?;

        let chain_height = self.gateway.get_chain_height().await?;
        let confirmations = self.policy.confirmations(tx.block_height, chain_height);

        info!(
            tx_hash = %tx_hash,
            height = tx.block_height,
            confirmations,
            is_final = self.policy.is_final(confirmations),
            "Assembled proof package"
        );

        Ok(ProofPackage::new(tx, block, proof, commitment, confirmations))
    }

    /// Merkle proof against `block`, refetching it once from upstream on mismatch
    async fn prove_inclusion(
        &self,
        tx_hash: &Hash32,
        block: BlockRecord,
    ) -> Result<(BlockRecord, MerkleProof), ProofError> {
        match self.merkle.build(tx_hash, &block.tx_hashes, &block.header.merkle_root) {
            Ok(proof) => return Ok((block, proof)),
            Err(ProofError::ProofConstruction(reason)) => {
                warn!(tx_hash = %tx_hash, height = block.height, %reason, "Merkle proof failed, refetching block");
                metrics::record_merkle_retry();
            }
            Err(e) => return Err(e),
        }

        let fresh = self.gateway.refresh_block(block.height).await?;
        let proof = self
            .merkle
            .build(tx_hash, &fresh.tx_hashes, &fresh.header.merkle_root)?;
        self.gateway.remember_block(fresh.clone()).await;
        Ok((fresh, proof))
    }
}
