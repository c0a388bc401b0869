//! Mock Fuego daemon for integration tests
//!
//! Serves the JSON-RPC subset the prover uses from an in-memory chain and
//! counts calls per method.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::post, Json, Router};
use fuego_core::extra::{encode_field, TAG_HEAT_COMMITMENT, TAG_NONCE, TAG_PUBKEY};
use fuego_core::merkle::merkle_root;
use fuego_core::{Hash32, MerkleHash};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const BLOCK_HEIGHT: u64 = 90;
pub const CHAIN_HEIGHT: u64 = 100;
pub const BURN_AMOUNT: u64 = 8_000_000;
pub const COMMITMENT: [u8; 32] = [0xc0; 32];
pub const BLOCK_TIMESTAMP: u64 = 1_700_000_000;

pub fn burn_hash() -> Hash32 {
    Hash32([0x42; 32])
}

pub fn plain_hash() -> Hash32 {
    Hash32([0x43; 32])
}

#[derive(Clone)]
pub struct MockTx {
    pub raw: Vec<u8>,
    pub extra: Vec<u8>,
    pub amounts: Vec<u64>,
    pub block_height: u64,
}

#[derive(Clone)]
pub struct MockBlock {
    pub miner_tx: Hash32,
    pub tx_hashes: Vec<Hash32>,
    pub merkle_root: Hash32,
}

impl MockBlock {
    pub fn new(miner_tx: Hash32, tx_hashes: Vec<Hash32>) -> Self {
        let mut leaves = vec![miner_tx];
        leaves.extend(&tx_hashes);
        let merkle_root = merkle_root(&leaves, MerkleHash::Sha256).expect("non-empty block");
        Self { miner_tx, tx_hashes, merkle_root }
    }
}

#[derive(Clone, Default)]
pub struct MockChain {
    pub height: u64,
    pub blocks: HashMap<u64, MockBlock>,
    pub txs: HashMap<Hash32, MockTx>,
}

/// `tx_extra` with a public key, a nonce, the commitment and an unknown trailing tag
pub fn burn_extra(commitment: [u8; 32]) -> Vec<u8> {
    let mut extra = vec![TAG_PUBKEY];
    extra.extend_from_slice(&[0x5a; 32]);
    extra.extend(encode_field(TAG_NONCE, &[1, 2, 3, 4]));
    extra.extend(encode_field(TAG_HEAT_COMMITMENT, &commitment));
    extra.extend(encode_field(0x7f, &[0xff; 3]));
    extra
}

impl MockChain {
    /// Block 90 holds a miner tx, a plain transfer, the burn and one more
    /// transfer; the daemon reports height 100.
    pub fn scenario() -> Self {
        let mut chain = Self {
            height: CHAIN_HEIGHT,
            ..Default::default()
        };
        let others = [Hash32([0x41; 32]), plain_hash(), burn_hash(), Hash32([0x44; 32])];
        chain
            .blocks
            .insert(BLOCK_HEIGHT, MockBlock::new(Hash32([0x40; 32]), others.to_vec()));

        chain.txs.insert(
            burn_hash(),
            MockTx {
                raw: vec![0x01, 0x02, 0x03, 0x04],
                extra: burn_extra(COMMITMENT),
                amounts: vec![BURN_AMOUNT - 1_000, 1_000],
                block_height: BLOCK_HEIGHT,
            },
        );
        chain.txs.insert(
            plain_hash(),
            MockTx {
                raw: vec![0x05],
                extra: {
                    let mut extra = vec![TAG_PUBKEY];
                    extra.extend_from_slice(&[0x11; 32]);
                    extra
                },
                amounts: vec![5],
                block_height: BLOCK_HEIGHT,
            },
        );
        chain
    }
}

/// Per-method JSON-RPC call counters
#[derive(Default)]
pub struct CallCounts(Mutex<HashMap<String, usize>>);

impl CallCounts {
    fn record(&self, method: &str) {
        *self.0.lock().unwrap().entry(method.to_string()).or_default() += 1;
    }

    pub fn get(&self, method: &str) -> usize {
        self.0.lock().unwrap().get(method).copied().unwrap_or(0)
    }
}

#[derive(Clone)]
struct DaemonState {
    chain: Arc<Mutex<MockChain>>,
    calls: Arc<CallCounts>,
}

pub struct MockDaemon {
    pub url: String,
    pub calls: Arc<CallCounts>,
    chain: Arc<Mutex<MockChain>>,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl MockDaemon {
    pub async fn start(chain: MockChain) -> Self {
        let state = DaemonState {
            chain: Arc::new(Mutex::new(chain)),
            calls: Arc::new(CallCounts::default()),
        };
        let router = Router::new()
            .route("/json_rpc", post(json_rpc))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Bind should succeed");
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            url: format!("http://{}/json_rpc", addr),
            calls: state.calls,
            chain: state.chain,
            _shutdown: shutdown_tx,
        }
    }

    pub fn set_height(&self, height: u64) {
        self.chain.lock().unwrap().height = height;
    }

    /// Make the header root disagree with the block's transaction list
    pub fn corrupt_root(&self, height: u64) {
        if let Some(block) = self.chain.lock().unwrap().blocks.get_mut(&height) {
            block.merkle_root = Hash32([0xde; 32]);
        }
    }
}

fn ok(id: &Value, result: Value) -> Json<Value> {
    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}))
}

fn header_json(height: u64, block: &MockBlock) -> Value {
    json!({
        "hash": format!("{:02x}", height % 256).repeat(32),
        "prev_hash": "00".repeat(32),
        "height": height,
        "merkle_root": block.merkle_root.to_string(),
        "timestamp": BLOCK_TIMESTAMP,
        "major_version": 7,
        "minor_version": 0,
        "nonce": 12345,
        "difficulty": 250_000,
        "reward": 8_000_000,
        "orphan_status": false
    })
}

async fn json_rpc(State(state): State<DaemonState>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default();
    let params = &req["params"];
    state.calls.record(method);

    let chain = state.chain.lock().unwrap().clone();
    match method {
        "getblockcount" => ok(&id, json!({"count": chain.height, "status": "OK"})),
        "getinfo" => ok(
            &id,
            json!({
                "status": "OK",
                "height": chain.height,
                "difficulty": 250_000,
                "tx_count": 1234,
                "tx_pool_size": 2,
                "version": "mock-4.2.0"
            }),
        ),
        "getblock" | "getblockheaderbyheight" => {
            let height = params["height"].as_u64().unwrap_or(u64::MAX);
            let Some(block) = chain.blocks.get(&height) else {
                return rpc_error(&id, -2, "Requested block height too big");
            };
            if method == "getblockheaderbyheight" {
                return ok(&id, json!({"status": "OK", "block_header": header_json(height, block)}));
            }
            ok(
                &id,
                json!({
                    "status": "OK",
                    "block_header": header_json(height, block),
                    "miner_tx_hash": block.miner_tx.to_string(),
                    "tx_hashes": block.tx_hashes.iter().map(|h| h.to_string()).collect::<Vec<_>>()
                }),
            )
        }
        "gettransactions" => {
            let requested = params["txs_hashes"][0].as_str().unwrap_or_default().to_string();
            let found = requested
                .parse::<Hash32>()
                .ok()
                .and_then(|hash| chain.txs.get(&hash).map(|tx| (hash, tx.clone())));
            let Some((hash, tx)) = found else {
                return ok(&id, json!({"status": "OK", "txs": [], "missed_tx": [requested]}));
            };
            let decoded = json!({
                "version": 1,
                "extra": tx.extra,
                "vout": tx.amounts.iter().map(|a| json!({"amount": a})).collect::<Vec<_>>()
            });
            ok(
                &id,
                json!({
                    "status": "OK",
                    "txs": [{
                        "tx_hash": hash.to_string(),
                        "as_hex": hex::encode(&tx.raw),
                        "as_json": decoded.to_string(),
                        "block_height": tx.block_height,
                        "block_timestamp": BLOCK_TIMESTAMP,
                        "in_pool": false
                    }],
                    "missed_tx": []
                }),
            )
        }
        other => rpc_error(&id, -32601, &format!("Method not found: {}", other)),
    }
}
