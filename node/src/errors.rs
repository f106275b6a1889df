// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bazaar_kernel::error::KernelError;
use serde_json::json;
use thiserror::Error;

use crate::events::event_commit::CommitError;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("{0}")]
    Kernel(#[from] KernelError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },
    #[error("Commit failed: {0}")]
    Commit(CommitError),
    #[error("Internal server error")]
    Internal,
}

impl NodeError {
    pub fn unreachable(peer: impl ToString, reason: impl ToString) -> Self {
        NodeError::PeerUnreachable {
            peer: peer.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            NodeError::Kernel(k_err) => match k_err {
                KernelError::ProductNotFound(_) | KernelError::PeerNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                KernelError::InsufficientStock { .. } => StatusCode::CONFLICT,
                KernelError::AmbiguousProduct { .. }
                | KernelError::PredatesProduct { .. }
                | KernelError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                KernelError::ClockExhausted(_) | KernelError::Encoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            NodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            NodeError::PeerUnreachable { .. } => StatusCode::BAD_GATEWAY,
            NodeError::Commit(_) | NodeError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CommitError> for NodeError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::Rejected(k_err) => NodeError::Kernel(k_err),
            other => NodeError::Commit(other),
        }
    }
}

impl From<JsonRejection> for NodeError {
    fn from(rejection: JsonRejection) -> Self {
        NodeError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            NodeError::Commit(_) | NodeError::Internal => {
                tracing::error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "erro": message
        }));

        (status, body).into_response()
    }
}
