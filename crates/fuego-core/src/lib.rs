//! fuego-core: protocol types for Fuego burn inclusion proofs
//!
//! A proof package lets a destination-chain contract check, without trusting
//! the prover, that a burn transaction was mined in a Fuego block:
//!
//! - [`merkle`]: inclusion path of the transaction hash under the header root
//! - [`extra`]: the commitment carried in the transaction's `tx_extra`
//! - [`confirmations`]: depth of the containing block
//! - [`package`]: the immutable bundle handed to the verifier
//!
//! Nothing here performs I/O; fetching lives in `fuego-prover`.

mod config;
mod error;
mod hash;
mod types;

pub mod confirmations;
pub mod extra;
pub mod merkle;
pub mod package;

pub use config::ProverConfig;
pub use confirmations::ConfirmationPolicy;
pub use error::{ConfigError, ProofError};
pub use extra::{Commitment, CommitmentExtractor, TxExtra};
pub use hash::{decode_hex, hex_bytes, Hash32};
pub use merkle::{MerkleHash, MerkleProof, MerkleProofBuilder, PathStep, Side};
pub use package::ProofPackage;
pub use types::{BlockHeader, BlockRecord, ChainInfo, TransactionRecord};

pub type Result<T> = std::result::Result<T, ProofError>;
