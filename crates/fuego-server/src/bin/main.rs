//! fuego-proof-server binary
//!
//! Run with:
//! ```bash
//! cargo run -p fuego-server -- --rpc-url http://localhost:18180/json_rpc --port 8080
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fuego_core::MerkleHash;
use fuego_server::{metrics, ServerBuilder, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fuego-proof-server")]
#[command(about = "Serve Merkle inclusion proofs for Fuego burn transactions")]
struct Args {
    /// JSON config file with `prover` and `server` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fuego daemon JSON-RPC URL
    #[arg(long, env = "FUEGO_RPC_URL")]
    rpc_url: Option<String>,

    /// Listen port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Cache lifetime for transactions and blocks, in seconds
    #[arg(long, env = "CACHE_TTL")]
    cache_ttl: Option<u64>,

    /// Merkle hash expected by the destination verifier
    #[arg(long)]
    merkle_hash: Option<MerkleHash>,

    /// Maximum concurrent requests
    #[arg(long)]
    max_concurrent_requests: Option<usize>,

    /// Milliseconds a request may wait for a free slot before a 503
    #[arg(long)]
    queue_timeout_ms: Option<u64>,

    /// Disable the Prometheus recorder
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fuego_server=info".parse()?)
                .add_directive("fuego_prover=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(url) = args.rpc_url {
        config.prover.rpc_url = url;
    }
    if let Some(ttl) = args.cache_ttl {
        config.prover = config.prover.with_cache_ttl(Duration::from_secs(ttl));
    }
    if let Some(hash) = args.merkle_hash {
        config.prover = config.prover.with_merkle_hash(hash);
    }

    tracing::info!(
        rpc_url = %config.prover.rpc_url,
        cache_ttl_secs = config.prover.cache_ttl_secs,
        merkle_hash = %config.prover.merkle_hash,
        "Merkle hash must match the destination-chain verifier"
    );

    let mut builder = ServerBuilder::from_config(config);
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(limit) = args.max_concurrent_requests {
        builder = builder.max_concurrent_requests(limit);
    }
    if let Some(ms) = args.queue_timeout_ms {
        builder = builder.queue_timeout(Duration::from_millis(ms));
    }
    if !args.no_metrics {
        builder = builder.metrics(metrics::init_prometheus_recorder()?);
    }

    let server = builder.build()?;
    tracing::info!("Server ready on {}", server.addr());
    server.run().await?;

    Ok(())
}
