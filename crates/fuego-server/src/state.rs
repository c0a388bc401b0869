//! Server state shared by every handler

use std::sync::Arc;

use fuego_prover::{ChainGateway, FuegoRpcClient, ProofAssembler};
use metrics_exporter_prometheus::PrometheusHandle;

/// Read-only after startup; the only mutable data lives in the assembler's caches
pub struct AppState<G = FuegoRpcClient> {
    pub assembler: ProofAssembler<G>,
    /// Upstream endpoint reported by `/health`
    pub rpc_url: String,
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState<G = FuegoRpcClient> = Arc<AppState<G>>;

impl<G: ChainGateway> AppState<G> {
    pub fn new(assembler: ProofAssembler<G>, rpc_url: impl Into<String>) -> Self {
        Self {
            assembler,
            rpc_url: rpc_url.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn into_shared(self) -> SharedState<G> {
        Arc::new(self)
    }
}
