use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no contract code deployed at {0}")]
    ContractNotDeployed(Address),

    #[error("deadline exceeded after {attempts} attempts in {elapsed:?}: {last_error}")]
    DeadlineExceeded { attempts: u32, elapsed: Duration, last_error: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("log stream ended")]
    StreamEnded,
}

impl EngineError {
    /// Whether `report` is the [`EngineError::Cancelled`] raised by an interrupted wait.
    pub fn is_cancellation(report: &eyre::Report) -> bool {
        matches!(report.downcast_ref::<EngineError>(), Some(EngineError::Cancelled))
    }
}
