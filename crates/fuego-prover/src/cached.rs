//! Cache-wrapped gateway

use std::sync::Arc;
use std::time::Duration;

use fuego_core::{BlockHeader, BlockRecord, ChainInfo, Hash32, ProofError, TransactionRecord};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::ResultCache;
use crate::metrics::{CACHE_BLOCKS, CACHE_TRANSACTIONS};
use crate::rpc::ChainGateway;

/// Gateway that memoizes transactions and blocks for a fixed TTL.
///
/// Chain height and daemon info always go upstream; headers are served from
/// a cached block when one is live.
pub struct CachedGateway<G> {
    inner: G,
    ttl: Duration,
    transactions: Arc<ResultCache<Hash32, TransactionRecord>>,
    blocks: Arc<ResultCache<u64, BlockRecord>>,
}

impl<G: ChainGateway> CachedGateway<G> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            transactions: Arc::new(ResultCache::new(CACHE_TRANSACTIONS)),
            blocks: Arc::new(ResultCache::new(CACHE_BLOCKS)),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn transactions(&self) -> &ResultCache<Hash32, TransactionRecord> {
        &self.transactions
    }

    pub fn blocks(&self) -> &ResultCache<u64, BlockRecord> {
        &self.blocks
    }

    /// Drop any cached copy and fetch the block straight from upstream.
    ///
    /// The fresh block is not stored; call [`remember_block`] once it has
    /// been validated.
    ///
    /// [`remember_block`]: CachedGateway::remember_block
    pub async fn refresh_block(&self, height: u64) -> Result<BlockRecord, ProofError> {
        self.blocks.invalidate(&height).await;
        debug!(height, "Bypassing block cache");
        self.inner.get_block(height).await
    }

    pub async fn remember_block(&self, block: BlockRecord) {
        self.blocks.insert(block.height, block, self.ttl).await;
    }

    /// Start background sweeps of both caches
    pub fn spawn_sweepers(&self, interval: Duration) -> CacheSweeper {
        CacheSweeper {
            handles: vec![
                self.transactions.spawn_sweeper(interval),
                self.blocks.spawn_sweeper(interval),
            ],
        }
    }
}

impl<G: ChainGateway> ChainGateway for CachedGateway<G> {
    async fn get_transaction(&self, hash: Hash32) -> Result<TransactionRecord, ProofError> {
        self.transactions
            .get_or_compute(hash, self.ttl, || self.inner.get_transaction(hash))
            .await
    }

    async fn get_block(&self, height: u64) -> Result<BlockRecord, ProofError> {
        self.blocks
            .get_or_compute(height, self.ttl, || self.inner.get_block(height))
            .await
    }

    async fn get_block_header(&self, height: u64) -> Result<BlockHeader, ProofError> {
        if let Some(block) = self.blocks.get(&height).await {
            return Ok(block.header);
        }
        self.inner.get_block_header(height).await
    }

    async fn get_chain_height(&self) -> Result<u64, ProofError> {
        self.inner.get_chain_height().await
    }

    async fn get_info(&self) -> Result<ChainInfo, ProofError> {
        self.inner.get_info().await
    }
}

/// Handle to the sweep tasks; aborts them on [`shutdown`] or drop
///
/// [`shutdown`]: CacheSweeper::shutdown
pub struct CacheSweeper {
    handles: Vec<JoinHandle<()>>,
}

impl CacheSweeper {
    pub fn shutdown(mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
