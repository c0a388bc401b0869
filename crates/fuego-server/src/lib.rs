//! fuego-server: HTTP service for Fuego burn inclusion proofs
//!
//! Serves `GET /proof/{txHash}` plus daemon status, raw block and
//! transaction lookups, and Prometheus metrics.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, ServiceConfig};
pub use error::ServerError;
pub use routes::create_router;
pub use server::{ProofServer, ServerBuilder};
pub use state::{AppState, SharedState};
