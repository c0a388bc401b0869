//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fuego_core::ProofError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Proof for {tx_hash} failed: {source}")]
    Proof {
        tx_hash: String,
        #[source]
        source: ProofError,
    },

    #[error("Transaction lookup for {tx_hash} failed: {source}")]
    Transaction {
        tx_hash: String,
        #[source]
        source: ProofError,
    },

    #[error("Block lookup at height {height} failed: {source}")]
    Block {
        height: u64,
        #[source]
        source: ProofError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Metrics recorder not installed")]
    MetricsUnavailable,

    #[error("Server busy: no request slot within {0:?}")]
    Overloaded(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// HTTP status for a pipeline failure
pub fn proof_status(err: &ProofError) -> StatusCode {
    match err {
        ProofError::NotFound(_) => StatusCode::NOT_FOUND,
        ProofError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProofError::Rpc { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ProofError::ProofConstruction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ProofError::MalformedExtra(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProofError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ProofError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Proof { source, .. }
            | ServerError::Transaction { source, .. }
            | ServerError::Block { source, .. } => proof_status(source),
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::MetricsUnavailable | ServerError::Overloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Io(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{error}` body
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Proof { source: ProofError::NotFound(_), .. }
            | ServerError::Transaction { source: ProofError::NotFound(_), .. } => {
                "Transaction not found".to_string()
            }
            ServerError::Block { source: ProofError::NotFound(_), .. } => "Block not found".to_string(),
            ServerError::Proof { source, .. }
            | ServerError::Transaction { source, .. }
            | ServerError::Block { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
