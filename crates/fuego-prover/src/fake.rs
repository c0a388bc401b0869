//! In-memory gateway with call counters for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use fuego_core::extra::{encode_field, TAG_HEAT_COMMITMENT, TAG_PUBKEY};
use fuego_core::merkle::merkle_root;
use fuego_core::{
    BlockHeader, BlockRecord, ChainInfo, Hash32, MerkleHash, ProofError, TransactionRecord,
};

use crate::rpc::ChainGateway;

pub const BLOCK_HEIGHT: u64 = 90;
pub const CHAIN_HEIGHT: u64 = 100;
pub const COMMITMENT: [u8; 32] = [0xc0; 32];

#[derive(Default)]
pub struct FakeGateway {
    transactions: HashMap<Hash32, TransactionRecord>,
    /// Successive responses per height; the last one repeats
    blocks: Mutex<HashMap<u64, VecDeque<BlockRecord>>>,
    chain_height: AtomicU64,
    pub tx_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub height_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
}

pub fn burn_extra(commitment: [u8; 32]) -> Vec<u8> {
    let mut extra = vec![TAG_PUBKEY];
    extra.extend_from_slice(&[0x5a; 32]);
    extra.extend(encode_field(TAG_HEAT_COMMITMENT, &commitment));
    extra
}

pub fn tx_hashes() -> Vec<Hash32> {
    (1..=5u8).map(|i| Hash32([i; 32])).collect()
}

pub fn block_with_root(height: u64, leaves: Vec<Hash32>, root: Hash32) -> BlockRecord {
    BlockRecord {
        height,
        header: BlockHeader::new(Hash32([0xb0; 32]), height, root, 1_700_000_000),
        tx_hashes: leaves,
    }
}

pub fn valid_block() -> BlockRecord {
    let leaves = tx_hashes();
    let root = merkle_root(&leaves, MerkleHash::Sha256).unwrap();
    block_with_root(BLOCK_HEIGHT, leaves, root)
}

impl FakeGateway {
    /// Block 90 with five transactions, the fourth being a burn, at chain height 100
    pub fn scenario() -> Self {
        let burn = tx_hashes()[3];
        let gateway = Self::default()
            .with_transaction(TransactionRecord {
                hash: burn,
                raw_data: vec![0x01, 0x02, 0x03],
                extra: burn_extra(COMMITMENT),
                amount: 8_000_000,
                block_height: BLOCK_HEIGHT,
                timestamp: 1_700_000_000,
            })
            .with_transaction(TransactionRecord {
                hash: tx_hashes()[1],
                raw_data: vec![0x04],
                extra: vec![TAG_PUBKEY],
                amount: 1,
                block_height: BLOCK_HEIGHT,
                timestamp: 1_700_000_000,
            })
            .with_blocks(BLOCK_HEIGHT, vec![valid_block()]);
        gateway.set_chain_height(CHAIN_HEIGHT);
        gateway
    }

    pub fn burn_hash() -> Hash32 {
        tx_hashes()[3]
    }

    pub fn with_transaction(mut self, tx: TransactionRecord) -> Self {
        self.transactions.insert(tx.hash, tx);
        self
    }

    pub fn with_blocks(self, height: u64, responses: Vec<BlockRecord>) -> Self {
        self.blocks
            .lock()
            .unwrap()
            .insert(height, responses.into_iter().collect());
        self
    }

    pub fn set_chain_height(&self, height: u64) {
        self.chain_height.store(height, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl ChainGateway for FakeGateway {
    async fn get_transaction(&self, hash: Hash32) -> Result<TransactionRecord, ProofError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .get(&hash)
            .cloned()
            .ok_or_else(|| ProofError::NotFound(format!("transaction {}", hash)))
    }

    async fn get_block(&self, height: u64) -> Result<BlockRecord, ProofError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let mut blocks = self.blocks.lock().unwrap();
        let responses = blocks
            .get_mut(&height)
            .ok_or_else(|| ProofError::NotFound(format!("block at height {}", height)))?;
        let block = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        block.ok_or_else(|| ProofError::NotFound(format!("block at height {}", height)))
    }

    async fn get_block_header(&self, height: u64) -> Result<BlockHeader, ProofError> {
        Ok(self.get_block(height).await?.header)
    }

    async fn get_chain_height(&self) -> Result<u64, ProofError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_height.load(Ordering::SeqCst))
    }

    async fn get_info(&self) -> Result<ChainInfo, ProofError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChainInfo {
            height: self.chain_height.load(Ordering::SeqCst),
            difficulty: Some(1_000),
            tx_count: None,
            tx_pool_size: None,
            version: Some("test".into()),
            top_block_hash: None,
        })
    }
}
