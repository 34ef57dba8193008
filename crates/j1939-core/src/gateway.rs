//! DiagnosticGateway trait - the bus abstraction every step requests through

use async_trait::async_trait;
use j1939_packets::{Acknowledgment, DiagnosticMessage, Packet};

use crate::error::{GatewayError, GatewayResult};

/// Everything received for one global (broadcast) request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult<M> {
    /// Responses in arrival order, at most one per source address
    pub packets: Vec<M>,
    /// Acknowledgments sent instead of data
    pub acks: Vec<Acknowledgment>,
}

impl<M> Default for RequestResult<M> {
    fn default() -> Self {
        Self {
            packets: Vec::new(),
            acks: Vec::new(),
        }
    }
}

impl<M> RequestResult<M> {
    pub fn new(packets: Vec<M>, acks: Vec<Acknowledgment>) -> Self {
        Self { packets, acks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty() && self.acks.is_empty()
    }
}

impl<M: DiagnosticMessage> RequestResult<M> {
    /// Addresses that answered with data
    pub fn responders(&self) -> Vec<u8> {
        self.packets.iter().map(|p| p.source_address()).collect()
    }
}

/// Answer to a destination-specific request.
///
/// "Absent" and "NACK" mean different things to the NACK check, so both are
/// kept distinct rather than folded into an `Option`.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectedResponse<M> {
    Packet(M),
    Ack(Acknowledgment),
    Absent,
}

impl<M> DirectedResponse<M> {
    pub fn packet(&self) -> Option<&M> {
        match self {
            DirectedResponse::Packet(p) => Some(p),
            _ => None,
        }
    }

    pub fn ack(&self) -> Option<&Acknowledgment> {
        match self {
            DirectedResponse::Ack(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DirectedResponse::Absent)
    }

    pub fn into_packet(self) -> Option<M> {
        match self {
            DirectedResponse::Packet(p) => Some(p),
            _ => None,
        }
    }
}

/// Bus access used by steps.
///
/// Implementations wait for the protocol timeout themselves; modules that
/// stay silent are left out of the result. `Err` is reserved for a bus that
/// cannot be used at all.
#[async_trait]
pub trait DiagnosticGateway: Send + Sync {
    /// Broadcast a request for `pgn` and collect every answer
    async fn request_global(&self, pgn: u32) -> GatewayResult<RequestResult<Packet>>;

    /// Request `pgn` from the module at `address`
    async fn request_directed(&self, pgn: u32, address: u8) -> GatewayResult<DirectedResponse<Packet>>;

    /// Broadcast a command carrying `data` on `pgn` and collect every answer.
    /// Gateways that can only issue requests refuse.
    async fn send_global(&self, pgn: u32, data: &[u8]) -> GatewayResult<RequestResult<Packet>> {
        let _ = data;
        Err(GatewayError::SendFailed(format!("commands on PGN {} are not supported", pgn)))
    }

    /// Send a command carrying `data` on `pgn` to the module at `address`
    async fn send_directed(&self, pgn: u32, address: u8, data: &[u8]) -> GatewayResult<DirectedResponse<Packet>> {
        let _ = (address, data);
        Err(GatewayError::SendFailed(format!("commands on PGN {} are not supported", pgn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use j1939_packets::AckResponse;

    #[test]
    fn test_directed_accessors() {
        let ack = Acknowledgment::create(1, AckResponse::Nack, 0xFECB);
        let response: DirectedResponse<Packet> = DirectedResponse::Ack(ack.clone());
        assert_eq!(response.ack(), Some(&ack));
        assert!(response.packet().is_none());
        assert!(!response.is_absent());
        assert!(DirectedResponse::<Packet>::Absent.is_absent());
    }
}
