//! fuego-client: client for the Fuego proof server
//!
//! Fetched packages can be re-verified locally with
//! [`fuego_core::ProofPackage::verify_inclusion`], without trusting the server.

pub mod client;
pub mod error;

pub use client::{ChainStatus, ProofClient};
pub use error::{ClientError, Result};
