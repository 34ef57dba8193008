//! Step errors

use j1939_core::GatewayError;
use thiserror::Error;

/// A failure that stops a step (and the run) instead of being reported as
/// a FAIL outcome
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The step cannot run with the vehicle in its current state
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The scheduler task ended without reporting
    #[error("Run interrupted: {0}")]
    Interrupted(String),
}

/// Result type for step execution
pub type StepResult<T> = Result<T, StepError>;
