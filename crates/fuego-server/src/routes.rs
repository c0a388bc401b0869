//! HTTP routes for the proof server

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use fuego_core::{hex_bytes, BlockHeader, Commitment, Hash32, ProofPackage, TransactionRecord};
use fuego_prover::ChainGateway;
use serde::Serialize;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::metrics;
use crate::state::SharedState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub fuego_rpc: String,
}

/// Daemon reachability; always served with 200
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusResponse {
    Online {
        height: u64,
        difficulty: Option<u64>,
        version: Option<String>,
    },
    Offline {
        error: String,
    },
}

/// Raw `tx_extra` and the commitment found in it, if any
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnInfoResponse {
    pub tx_hash: Hash32,
    #[serde(with = "hex_bytes")]
    pub tx_extra: Vec<u8>,
    pub commitment: Option<Commitment>,
}

/// Decrements the in-flight gauge even when the client disconnects
struct InFlight;

impl InFlight {
    fn start() -> Self {
        metrics::record_proof_request_start();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::record_proof_request_end();
    }
}

async fn health<G: ChainGateway + 'static>(State(state): State<SharedState<G>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        fuego_rpc: state.rpc_url.clone(),
    })
}

async fn status<G: ChainGateway + 'static>(State(state): State<SharedState<G>>) -> Json<StatusResponse> {
    let response = match state.assembler.gateway().get_info().await {
        Ok(info) => {
            metrics::set_chain_height(info.height);
            StatusResponse::Online {
                height: info.height,
                difficulty: info.difficulty,
                version: info.version,
            }
        }
        Err(e) => {
            warn!(error = %e, "Fuego daemon unreachable");
            StatusResponse::Offline { error: e.to_string() }
        }
    };
    Json(response)
}

async fn proof<G: ChainGateway + 'static>(
    State(state): State<SharedState<G>>,
    Path(tx_hash): Path<String>,
) -> Result<Json<ProofPackage>> {
    let _in_flight = InFlight::start();
    let start = Instant::now();

    let result = assemble(state, &tx_hash).await;

    let outcome = match &result {
        Ok(_) => metrics::OUTCOME_OK,
        Err(ServerError::Proof { source, .. }) => source.kind(),
        Err(_) => "internal",
    };
    metrics::record_proof_request(outcome, start.elapsed());

    result.map(Json)
}

async fn assemble<G: ChainGateway + 'static>(state: SharedState<G>, tx_hash: &str) -> Result<ProofPackage> {
    let hash: Hash32 = tx_hash.parse().map_err(|source| ServerError::Proof {
        tx_hash: tx_hash.to_string(),
        source,
    })?;

    // Detached so upstream calls run to completion if the client goes away
    let task = tokio::spawn(async move { state.assembler.assemble(hash).await });
    let result = task
        .await
        .map_err(|e| ServerError::Internal(format!("proof task failed: {}", e)))?;

    match result {
        Ok(package) => {
            info!(tx_hash = %hash, confirmations = package.confirmations(), "Served proof");
            Ok(package)
        }
        Err(source) => {
            warn!(tx_hash = %hash, error = %source, "Proof request failed");
            Err(ServerError::Proof {
                tx_hash: hash.to_string(),
                source,
            })
        }
    }
}

async fn block<G: ChainGateway + 'static>(
    State(state): State<SharedState<G>>,
    Path(height): Path<String>,
) -> Result<Json<BlockHeader>> {
    let height: u64 = height
        .parse()
        .map_err(|_| ServerError::InvalidInput(format!("Invalid block height: {}", height)))?;

    let header = state
        .assembler
        .gateway()
        .get_block_header(height)
        .await
        .map_err(|source| ServerError::Block { height, source })?;
    Ok(Json(header))
}

async fn fetch_transaction<G: ChainGateway + 'static>(
    state: &SharedState<G>,
    tx_hash: &str,
) -> Result<TransactionRecord> {
    let lookup_err = |source| ServerError::Transaction {
        tx_hash: tx_hash.to_string(),
        source,
    };
    let hash: Hash32 = tx_hash.parse().map_err(lookup_err)?;
    state
        .assembler
        .gateway()
        .get_transaction(hash)
        .await
        .map_err(lookup_err)
}

async fn transaction<G: ChainGateway + 'static>(
    State(state): State<SharedState<G>>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TransactionRecord>> {
    fetch_transaction(&state, &tx_hash).await.map(Json)
}

async fn burn_info<G: ChainGateway + 'static>(
    State(state): State<SharedState<G>>,
    Path(tx_hash): Path<String>,
) -> Result<Json<BurnInfoResponse>> {
    let tx = fetch_transaction(&state, &tx_hash).await?;
    let commitment = state.assembler.extractor().extract(&tx.extra).ok();

    Ok(Json(BurnInfoResponse {
        tx_hash: tx.hash,
        tx_extra: tx.extra,
        commitment,
    }))
}

async fn prometheus<G: ChainGateway + 'static>(State(state): State<SharedState<G>>) -> Result<String> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ServerError::MetricsUnavailable)
}

/// Request slots shared by the routes that reach the daemon
#[derive(Clone)]
struct Limiter {
    permits: Arc<Semaphore>,
    queue_timeout: Duration,
}

/// Wait at most `queue_timeout` for a slot, then shed the request with 503
async fn limit_concurrency(State(limiter): State<Limiter>, request: Request, next: Next) -> Response {
    let permit = tokio::time::timeout(limiter.queue_timeout, limiter.permits.acquire_owned()).await;
    let _permit = match permit {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => return ServerError::Internal("request limiter closed".into()).into_response(),
        Err(_) => {
            warn!(path = %request.uri().path(), "Request slot wait timed out");
            return ServerError::Overloaded(limiter.queue_timeout).into_response();
        }
    };
    next.run(request).await
}

/// Create the router with all routes
///
/// `/health` and `/metrics` bypass the request limiter so they answer while
/// daemon-bound routes are saturated.
pub fn create_router<G: ChainGateway + 'static>(state: SharedState<G>, config: &ServerConfig) -> Router {
    let limiter = Limiter {
        permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
        queue_timeout: config.queue_timeout(),
    };

    let limited = Router::new()
        .route("/status", get(status::<G>))
        .route("/api/status", get(status::<G>))
        .route("/proof/{tx_hash}", get(proof::<G>))
        .route("/api/proof/{tx_hash}", get(proof::<G>))
        .route("/block/{height}", get(block::<G>))
        .route("/tx/{tx_hash}", get(transaction::<G>))
        .route("/burn-info/{tx_hash}", get(burn_info::<G>))
        .layer(middleware::from_fn_with_state(limiter, limit_concurrency));

    Router::new()
        .route("/health", get(health::<G>))
        .route("/metrics", get(prometheus::<G>))
        .merge(limited)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use fuego_core::{BlockRecord, ChainInfo, ProofError, ProverConfig};
    use fuego_prover::{FuegoRpcClient, ProofAssembler};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Router whose upstream refuses connections
    fn offline_router() -> Router {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/json_rpc", listener.local_addr().unwrap());
        drop(listener);

        let rpc = FuegoRpcClient::new(&url, Duration::from_secs(1)).unwrap();
        let assembler = ProofAssembler::new(rpc, &ProverConfig::default());
        create_router(AppState::new(assembler, url).into_shared(), &ServerConfig::default())
    }

    /// Daemon that never answers
    struct StalledGateway;

    impl ChainGateway for StalledGateway {
        async fn get_transaction(&self, _hash: Hash32) -> std::result::Result<TransactionRecord, ProofError> {
            std::future::pending().await
        }

        async fn get_block(&self, _height: u64) -> std::result::Result<BlockRecord, ProofError> {
            std::future::pending().await
        }

        async fn get_block_header(&self, _height: u64) -> std::result::Result<BlockHeader, ProofError> {
            std::future::pending().await
        }

        async fn get_chain_height(&self) -> std::result::Result<u64, ProofError> {
            std::future::pending().await
        }

        async fn get_info(&self) -> std::result::Result<ChainInfo, ProofError> {
            std::future::pending().await
        }
    }

    /// Single-slot router in front of a daemon that never answers
    fn saturated_router(queue_timeout: Duration) -> Router {
        let assembler = ProofAssembler::new(StalledGateway, &ProverConfig::default());
        let config = ServerConfig {
            max_concurrent_requests: 1,
            queue_timeout_ms: queue_timeout.as_millis() as u64,
            ..ServerConfig::default()
        };
        create_router(AppState::new(assembler, "stalled").into_shared(), &config)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_reports_upstream() {
        let (status, body) = get_json(offline_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["fuegoRpc"].as_str().unwrap().ends_with("/json_rpc"));
    }

    #[tokio::test]
    async fn test_bad_hash_is_bad_request() {
        let (status, body) = get_json(offline_router(), "/proof/not-a-hash").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());

        let (status, _) = get_json(offline_router(), &format!("/tx/{}", "ab".repeat(31))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_service_unavailable() {
        let uri = format!("/api/proof/{}", "ab".repeat(32));
        let (status, body) = get_json(offline_router(), &uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("Network error"));
    }

    #[tokio::test]
    async fn test_status_offline_is_still_ok() {
        let (status, body) = get_json(offline_router(), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "offline");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_block_height() {
        let (status, body) = get_json(offline_router(), "/block/ninety").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: Invalid block height: ninety");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (status, _) = get_json(offline_router(), "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_full_queue_sheds_with_bounded_503() {
        let router = saturated_router(Duration::from_millis(100));
        let uri = format!("/proof/{}", "ab".repeat(32));

        let holder = {
            let (router, uri) = (router.clone(), uri.clone());
            tokio::spawn(async move { get_json(router, &uri).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let start = Instant::now();
        let (status, body) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("Server busy"));
        assert!(start.elapsed() < Duration::from_secs(2));

        let (status, _) = get_json(router.clone(), "/block/90").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        // liveness stays outside the limiter
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fuegoRpc"], "stalled");

        assert!(!holder.is_finished());
        holder.abort();
    }

    #[test]
    fn test_status_response_shape() {
        let online = serde_json::to_value(StatusResponse::Online {
            height: 100,
            difficulty: Some(5),
            version: None,
        })
        .unwrap();
        assert_eq!(online["status"], "online");
        assert_eq!(online["height"], 100);
    }
}
