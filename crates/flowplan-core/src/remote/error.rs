//! Remote service error types

use std::time::Duration;

use thiserror::Error;

/// Failure talking to a remote planning or scheduling service.
///
/// None of these reach the user directly; the planner falls back to the
/// local algorithms on every variant.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    /// Whether the failure came from the transport rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
