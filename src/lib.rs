//! fuego-proof: Merkle inclusion proofs for Fuego burn transactions
//!
//! Umbrella crate re-exporting the workspace members.

pub use fuego_client;
pub use fuego_core;
pub use fuego_prover;
pub use fuego_server;
