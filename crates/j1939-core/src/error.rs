//! Gateway error types

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised by a [`DiagnosticGateway`](crate::DiagnosticGateway).
///
/// A module that does not answer is not an error; it shows up as an empty
/// [`RequestResult`](crate::RequestResult) or
/// [`DirectedResponse::Absent`](crate::DirectedResponse::Absent).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The bus adapter is not connected
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    /// Sending the request failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}
