//! fuego-prover: upstream access and proof assembly
//!
//! [`FuegoRpcClient`] talks JSON-RPC to a Fuego daemon, [`CachedGateway`]
//! memoizes its answers for a fixed TTL, and [`ProofAssembler`] runs the
//! per-request pipeline that turns a transaction hash into a
//! [`fuego_core::ProofPackage`].

pub mod assembler;
pub mod cache;
pub mod cached;
pub mod metrics;
pub mod rpc;

#[cfg(test)]
mod fake;

pub use assembler::ProofAssembler;
pub use cache::ResultCache;
pub use cached::{CacheSweeper, CachedGateway};
pub use rpc::{ChainGateway, FuegoRpcClient};
