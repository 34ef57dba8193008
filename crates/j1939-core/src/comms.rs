//! Typed request layer over a [`DiagnosticGateway`]

use std::sync::Arc;

use j1939_packets::{pgn, Acknowledgment, DiagnosticMessage, Packet};
use tracing::{debug, warn};

use crate::error::GatewayResult;
use crate::gateway::{DiagnosticGateway, DirectedResponse, RequestResult};

/// Issues requests and decodes the answers into typed messages.
///
/// A response that fails to decode is logged and dropped on its own; the
/// other modules' responses to the same request are kept.
#[derive(Clone)]
pub struct CommunicationsModule {
    gateway: Arc<dyn DiagnosticGateway>,
}

impl CommunicationsModule {
    pub fn new(gateway: Arc<dyn DiagnosticGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<dyn DiagnosticGateway> {
        &self.gateway
    }

    /// Global request for `M`
    pub async fn request_global<M: DiagnosticMessage>(&self) -> GatewayResult<RequestResult<M>> {
        let raw = self.gateway.request_global(M::PGN).await?;
        let mut packets = Vec::with_capacity(raw.packets.len());
        for packet in raw.packets {
            if let Some(message) = decode::<M>(packet) {
                packets.push(message);
            }
        }
        debug!(
            message = M::NAME,
            responses = packets.len(),
            acks = raw.acks.len(),
            "Global request complete"
        );
        Ok(RequestResult::new(packets, raw.acks))
    }

    /// Destination-specific request for `M`. A malformed answer counts as absent.
    pub async fn request_directed<M: DiagnosticMessage>(&self, address: u8) -> GatewayResult<DirectedResponse<M>> {
        let response = decode_directed(self.gateway.request_directed(M::PGN, address).await?);
        debug!(message = M::NAME, address, absent = response.is_absent(), "Directed request complete");
        Ok(response)
    }

    /// Broadcast `command` and decode the answers as the same message type
    pub async fn send_global<M: DiagnosticMessage>(&self, command: &M) -> GatewayResult<RequestResult<M>> {
        let raw = self.gateway.send_global(M::PGN, command.packet().bytes()).await?;
        let mut packets = Vec::with_capacity(raw.packets.len());
        for packet in raw.packets {
            if let Some(message) = decode::<M>(packet) {
                packets.push(message);
            }
        }
        debug!(
            message = M::NAME,
            responses = packets.len(),
            acks = raw.acks.len(),
            "Global command complete"
        );
        Ok(RequestResult::new(packets, raw.acks))
    }

    /// Send `command` to `address`. A malformed answer counts as absent.
    pub async fn send_directed<M: DiagnosticMessage>(
        &self,
        address: u8,
        command: &M,
    ) -> GatewayResult<DirectedResponse<M>> {
        let raw = self
            .gateway
            .send_directed(M::PGN, address, command.packet().bytes())
            .await?;
        let response = decode_directed(raw);
        debug!(message = M::NAME, address, absent = response.is_absent(), "Directed command complete");
        Ok(response)
    }

    /// Global DM11 (clear diagnostic information). Modules answer with
    /// acknowledgments only.
    pub async fn request_dm11_global(&self) -> GatewayResult<Vec<Acknowledgment>> {
        let raw = self.gateway.request_global(pgn::DM11).await?;
        debug!(acks = raw.acks.len(), "Global DM11 complete");
        Ok(raw.acks)
    }

    /// Destination-specific DM11
    pub async fn request_dm11_directed(&self, address: u8) -> GatewayResult<Option<Acknowledgment>> {
        let ack = self.gateway.request_directed(pgn::DM11, address).await?.ack().cloned();
        debug!(address, ack = ?ack.as_ref().map(|a| a.response()), "Directed DM11 complete");
        Ok(ack)
    }
}

fn decode_directed<M: DiagnosticMessage>(raw: DirectedResponse<Packet>) -> DirectedResponse<M> {
    match raw {
        DirectedResponse::Packet(packet) => match decode::<M>(packet) {
            Some(message) => DirectedResponse::Packet(message),
            None => DirectedResponse::Absent,
        },
        DirectedResponse::Ack(ack) => DirectedResponse::Ack(ack),
        DirectedResponse::Absent => DirectedResponse::Absent,
    }
}

fn decode<M: DiagnosticMessage>(packet: Packet) -> Option<M> {
    let address = packet.source_address();
    match M::from_packet(packet) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(message = M::NAME, address, error = %e, "Dropping malformed response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use j1939_packets::messages::Dm6PendingDtcs;
    use j1939_packets::{AckResponse, LampStatus};

    /// Answers every request with fixed packets
    struct FixedGateway {
        global: Vec<Packet>,
        directed: Packet,
    }

    #[async_trait]
    impl DiagnosticGateway for FixedGateway {
        async fn request_global(&self, pgn: u32) -> GatewayResult<RequestResult<Packet>> {
            Ok(RequestResult::new(
                self.global.clone(),
                vec![Acknowledgment::create(0x17, AckResponse::Nack, pgn)],
            ))
        }

        async fn request_directed(&self, _pgn: u32, _address: u8) -> GatewayResult<DirectedResponse<Packet>> {
            Ok(DirectedResponse::Packet(self.directed.clone()))
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_isolated() {
        let good = Dm6PendingDtcs::create(0, LampStatus::Off, &[]);
        let truncated = Packet::new(pgn::DM6, 1, vec![0x00]);
        let comms = CommunicationsModule::new(Arc::new(FixedGateway {
            global: vec![good.packet().clone(), truncated.clone()],
            directed: truncated,
        }));

        let result = comms.request_global::<Dm6PendingDtcs>().await.unwrap();
        assert_eq!(result.packets, vec![good]);
        assert_eq!(result.acks.len(), 1);

        let directed = comms.request_directed::<Dm6PendingDtcs>(1).await.unwrap();
        assert!(directed.is_absent());
    }

    #[tokio::test]
    async fn test_request_only_gateway_refuses_commands() {
        let comms = CommunicationsModule::new(Arc::new(FixedGateway {
            global: vec![],
            directed: Packet::new(pgn::DM6, 0, vec![]),
        }));
        let command = Dm6PendingDtcs::create(0xF9, LampStatus::Off, &[]);
        assert!(matches!(
            comms.send_directed(0, &command).await,
            Err(crate::GatewayError::SendFailed(_))
        ));
        assert!(comms.send_global(&command).await.is_err());
    }

    #[tokio::test]
    async fn test_dm11_acks() {
        let comms = CommunicationsModule::new(Arc::new(FixedGateway {
            global: vec![],
            directed: Acknowledgment::create(0, AckResponse::Ack, pgn::DM11).packet().clone(),
        }));

        let acks = comms.request_dm11_global().await.unwrap();
        assert_eq!(acks[0].acknowledged_pgn(), pgn::DM11);
        // a packet answer to DM11 carries no acknowledgment
        assert_eq!(comms.request_dm11_directed(0).await.unwrap(), None);
    }
}
