//! Proof server implementation

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use fuego_core::ProverConfig;
use fuego_prover::{ChainGateway, FuegoRpcClient, ProofAssembler};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{ServerConfig, ServiceConfig};
use crate::error::{Result, ServerError};
use crate::routes::create_router;
use crate::state::{AppState, SharedState};

/// HTTP front end for a [`ProofAssembler`]
pub struct ProofServer<G = FuegoRpcClient> {
    state: SharedState<G>,
    config: ServerConfig,
}

impl<G: ChainGateway + 'static> ProofServer<G> {
    pub fn new(state: AppState<G>, config: ServerConfig) -> Self {
        Self {
            state: state.into_shared(),
            config,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), &self.config)
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState<G> {
        self.state.clone()
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.addr
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, sweeping caches meanwhile
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let sweeper = self.state.assembler.spawn_sweepers();
        let router = self.router();

        info!(%addr, merkle_hash = %self.state.assembler.merkle_hash(), "Starting Fuego proof server");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        sweeper.shutdown();
        info!("Fuego proof server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for a [`ProofServer`] backed by the Fuego JSON-RPC client
pub struct ServerBuilder {
    prover: ProverConfig,
    server: ServerConfig,
    metrics: Option<PrometheusHandle>,
}

impl ServerBuilder {
    pub fn new(prover: ProverConfig) -> Self {
        Self {
            prover,
            server: ServerConfig::default(),
            metrics: None,
        }
    }

    pub fn from_config(config: ServiceConfig) -> Self {
        Self {
            prover: config.prover,
            server: config.server,
            metrics: None,
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.server.addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.server.addr = ([0, 0, 0, 0], port).into();
        self
    }

    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.server.max_concurrent_requests = limit;
        self
    }

    pub fn queue_timeout(mut self, timeout: Duration) -> Self {
        self.server.queue_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn build(self) -> Result<ProofServer<FuegoRpcClient>> {
        self.server
            .validate()
            .map_err(|e| ServerError::InvalidInput(e.to_string()))?;
        self.prover
            .validate()
            .map_err(|e| ServerError::InvalidInput(e.to_string()))?;

        let rpc = FuegoRpcClient::from_config(&self.prover)
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        let assembler = ProofAssembler::new(rpc, &self.prover);

        let mut state = AppState::new(assembler, self.prover.rpc_url.clone());
        if let Some(handle) = self.metrics {
            state = state.with_metrics(handle);
        }

        Ok(ProofServer::new(state, self.server))
    }
}
