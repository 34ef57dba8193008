//! J1939-21 acknowledgment messages (PGN 59392)

use std::fmt;

use serde::Serialize;

use crate::error::{require_len, PacketResult};
use crate::packet::{pgn, DiagnosticMessage, Packet, TOOL_ADDRESS};

/// Control byte of an acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckResponse {
    Ack,
    Nack,
    Denied,
    Busy,
    Unknown(u8),
}

impl From<u8> for AckResponse {
    fn from(value: u8) -> Self {
        match value {
            0 => AckResponse::Ack,
            1 => AckResponse::Nack,
            2 => AckResponse::Denied,
            3 => AckResponse::Busy,
            other => AckResponse::Unknown(other),
        }
    }
}

impl From<AckResponse> for u8 {
    fn from(value: AckResponse) -> Self {
        match value {
            AckResponse::Ack => 0,
            AckResponse::Nack => 1,
            AckResponse::Denied => 2,
            AckResponse::Busy => 3,
            AckResponse::Unknown(other) => other,
        }
    }
}

impl fmt::Display for AckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckResponse::Ack => f.write_str("ACK"),
            AckResponse::Nack => f.write_str("NACK"),
            AckResponse::Denied => f.write_str("Denied"),
            AckResponse::Busy => f.write_str("Busy"),
            AckResponse::Unknown(v) => write!(f, "Unknown({})", v),
        }
    }
}

/// Acknowledgment sent by a module in lieu of the requested data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    packet: Packet,
    response: AckResponse,
    acknowledged_pgn: u32,
}

impl Acknowledgment {
    /// Build the acknowledgment `address` would send for a request of `pgn`
    pub fn create(source: u8, response: AckResponse, acknowledged_pgn: u32) -> Self {
        let data = vec![
            u8::from(response),
            0xFF,
            0xFF,
            0xFF,
            TOOL_ADDRESS,
            (acknowledged_pgn & 0xFF) as u8,
            ((acknowledged_pgn >> 8) & 0xFF) as u8,
            ((acknowledged_pgn >> 16) & 0xFF) as u8,
        ];
        Self {
            packet: Packet::new(pgn::ACKNOWLEDGMENT, source, data),
            response,
            acknowledged_pgn,
        }
    }

    pub fn response(&self) -> AckResponse {
        self.response
    }

    pub fn acknowledged_pgn(&self) -> u32 {
        self.acknowledged_pgn
    }

    pub fn is_nack(&self) -> bool {
        self.response == AckResponse::Nack
    }
}

impl DiagnosticMessage for Acknowledgment {
    const PGN: u32 = pgn::ACKNOWLEDGMENT;
    const NAME: &'static str = "Acknowledgment";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 8)?;
        let data = packet.bytes();
        let response = AckResponse::from(data[0]);
        let acknowledged_pgn = (data[5] as u32) | ((data[6] as u32) << 8) | ((data[7] as u32) << 16);
        Ok(Self {
            packet,
            response,
            acknowledged_pgn,
        })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acknowledgment from {}: Response = {}, PGN = {}",
            self.module_name(),
            self.response,
            self.acknowledged_pgn
        )
    }
}
