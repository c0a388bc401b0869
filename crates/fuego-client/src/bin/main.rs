//! fuego-proof-client: fetch a proof package and check it locally

use clap::Parser;
use fuego_client::{ChainStatus, ProofClient};
use fuego_core::confirmations::DEFAULT_FINALITY_THRESHOLD;
use fuego_core::{Hash32, MerkleHash};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fuego-proof-client")]
#[command(about = "Fetch and verify a Fuego burn inclusion proof")]
struct Args {
    /// Proof server base URL
    server_url: String,

    /// Burn transaction hash (hex)
    tx_hash: Hash32,

    /// Merkle hash used by the destination verifier
    #[arg(long = "hash", default_value = "sha256")]
    merkle_hash: MerkleHash,

    /// Confirmations required for finality
    #[arg(long, default_value_t = DEFAULT_FINALITY_THRESHOLD)]
    threshold: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fuego_client=warn".parse()?))
        .init();

    let args = Args::parse();
    let client = ProofClient::new(&args.server_url)?;

    match client.status().await {
        Ok(ChainStatus::Online { height, .. }) => println!("Fuego chain height: {}", height),
        Ok(ChainStatus::Offline { error }) => println!("Fuego daemon offline: {}", error),
        Err(e) => println!("Status unavailable: {}", e),
    }

    let package = client.proof(&args.tx_hash).await?;
    println!("{}", serde_json::to_string_pretty(&package)?);

    let included = package.verify_inclusion(args.merkle_hash);
    let is_final = package.is_final(args.threshold);
    println!(
        "[{}] Merkle inclusion ({})",
        if included { "OK" } else { "FAIL" },
        args.merkle_hash
    );
    println!(
        "[{}] {} confirmations (threshold {})",
        if is_final { "OK" } else { "PENDING" },
        package.confirmations(),
        args.threshold
    );

    if !included {
        anyhow::bail!("inclusion proof does not match block header root");
    }
    Ok(())
}
