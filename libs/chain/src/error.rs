use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Failures surfaced by the node client, split by how the caller should react.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport failure or temporary unavailability; safe to retry.
    #[error("network error: {0}")]
    Network(String),

    /// The provider refused the block range (too wide or too many results).
    #[error("block range [{from}, {to}] rejected by provider: {reason}")]
    RangeTooLarge { from: u64, to: u64, reason: String },

    /// The live log stream failed or ended.
    #[error("subscription error: {0}")]
    Subscription(String),
}

// Providers phrase range caps differently, e.g.
// "query returned more than 10000 results",
// "block range is too wide", "exceed maximum block range: 5000".
const RANGE_HINTS: [&str; 5] =
    ["block range", "more than", "range is too", "range too", "limit exceeded"];

pub fn is_range_rejection(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    RANGE_HINTS.iter().any(|hint| message.contains(hint))
}

impl ChainError {
    pub fn from_rpc(e: RpcError<TransportErrorKind>) -> Self {
        ChainError::Network(e.to_string())
    }

    pub fn from_ranged_rpc(e: RpcError<TransportErrorKind>, from: u64, to: u64) -> Self {
        match e.as_error_resp() {
            Some(payload) if is_range_rejection(&payload.message) => {
                ChainError::RangeTooLarge { from, to, reason: payload.message.to_string() }
            }
            _ => ChainError::Network(e.to_string()),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Network(_))
    }
}
