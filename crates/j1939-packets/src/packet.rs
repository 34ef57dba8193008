//! Raw J1939 packets and the decoded-message abstraction

use std::fmt;

use bytes::Bytes;

use crate::error::{PacketError, PacketResult};
use crate::lookup::address_name;

/// Parameter Group Numbers used by the diagnostic test procedure
pub mod pgn {
    /// Acknowledgment (J1939-21)
    pub const ACKNOWLEDGMENT: u32 = 0xE800;
    /// Request (J1939-21)
    pub const REQUEST: u32 = 0xEA00;
    /// DM1 active DTCs
    pub const DM1: u32 = 0xFECA;
    /// DM2 previously active DTCs
    pub const DM2: u32 = 0xFECB;
    /// DM5 diagnostic readiness 1
    pub const DM5: u32 = 0xFECE;
    /// DM6 emission-related pending DTCs
    pub const DM6: u32 = 0xFECF;
    /// DM11 clear/reset of active DTCs
    pub const DM11: u32 = 0xFED3;
    /// DM12 emission-related active DTCs
    pub const DM12: u32 = 0xFED4;
    /// DM20 monitor performance ratio
    pub const DM20: u32 = 0xC200;
    /// DM21 diagnostic readiness 2
    pub const DM21: u32 = 0xC100;
    /// DM22 individual clear/reset of active and previously active DTC
    pub const DM22: u32 = 0xC300;
    /// DM23 previously MIL-on DTCs
    pub const DM23: u32 = 0xFDB5;
    /// DM25 expanded freeze frame
    pub const DM25: u32 = 0xFDB7;
    /// DM26 diagnostic readiness 3
    pub const DM26: u32 = 0xFDB8;
    /// DM28 permanent DTCs
    pub const DM28: u32 = 0xFD80;
    /// DM29 regulated DTC counts
    pub const DM29: u32 = 0x9E00;
    /// DM30 scaled test results
    pub const DM30: u32 = 0xA400;
    /// DM31 DTC to lamp association
    pub const DM31: u32 = 0xA300;
    /// DM33 emission increasing AECD active time
    pub const DM33: u32 = 0xA100;
    /// Engine hours, revolutions
    pub const ENGINE_HOURS: u32 = 0xFEE5;
    /// Idle operation
    pub const IDLE_OPERATION: u32 = 0xFEDC;
}

/// Source address the test tool sends requests and commands from
pub const TOOL_ADDRESS: u8 = 0xF9;

/// One received (or simulated) J1939 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pgn: u32,
    source: u8,
    data: Bytes,
}

impl Packet {
    pub fn new(pgn: u32, source: u8, data: impl Into<Bytes>) -> Self {
        Self {
            pgn,
            source,
            data: data.into(),
        }
    }

    pub fn pgn(&self) -> u32 {
        self.pgn
    }

    pub fn source_address(&self) -> u8 {
        self.source
    }

    /// Raw payload bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_u8(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Little-endian 16-bit value starting at `index`
    pub fn get_u16(&self, index: usize) -> Option<u16> {
        let b = self.data.get(index..index + 2)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Little-endian 32-bit value starting at `index`
    pub fn get_u32(&self, index: usize) -> Option<u32> {
        let b = self.data.get(index..index + 4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:06X} {:02X} [{}] {}",
            self.pgn,
            self.source,
            self.data.len(),
            hex::encode_upper(&self.data)
        )
    }
}

/// A decoded diagnostic message.
///
/// Every decoded message keeps the packet it was decoded from so that
/// byte-level comparisons between global and destination-specific responses
/// stay possible after decoding.
pub trait DiagnosticMessage: Sized + Send + Sync + 'static {
    /// PGN this message is carried on
    const PGN: u32;
    /// Short name used in logs ("DM6", "DM21", ...)
    const NAME: &'static str;

    /// Decode the packet's payload. The PGN has already been checked.
    fn decode(packet: Packet) -> PacketResult<Self>;

    /// The packet this message was decoded from
    fn packet(&self) -> &Packet;

    /// Check the PGN and decode
    fn from_packet(packet: Packet) -> PacketResult<Self> {
        if packet.pgn() != Self::PGN {
            return Err(PacketError::WrongPgn {
                name: Self::NAME,
                expected: Self::PGN,
                actual: packet.pgn(),
            });
        }
        Self::decode(packet)
    }

    fn source_address(&self) -> u8 {
        self.packet().source_address()
    }

    fn module_name(&self) -> String {
        address_name(self.source_address())
    }
}

/// Messages where values at or above this are "not available" / error indicators
pub const U16_NOT_AVAILABLE: u16 = 0xFB00;
/// 32-bit counterpart of [`U16_NOT_AVAILABLE`]
pub const U32_NOT_AVAILABLE: u32 = 0xFB00_0000;

/// `Some(value)` unless the value is in the J1939 reserved range
pub fn available_u16(value: u16) -> Option<u16> {
    (value < U16_NOT_AVAILABLE).then_some(value)
}

/// `Some(value)` unless the value is in the J1939 reserved range
pub fn available_u32(value: u32) -> Option<u32> {
    (value < U32_NOT_AVAILABLE).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_accessors() {
        let packet = Packet::new(pgn::DM21, 0, vec![0x34, 0x12, 0x78, 0x56, 0xAA]);
        assert_eq!(packet.get_u8(4), Some(0xAA));
        assert_eq!(packet.get_u16(0), Some(0x1234));
        assert_eq!(packet.get_u32(0), Some(0x5678_1234));
        assert_eq!(packet.get_u16(4), None);
    }

    #[test]
    fn test_display() {
        let packet = Packet::new(pgn::DM6, 0x3D, vec![0x00, 0xFF]);
        assert_eq!(packet.to_string(), "00FECF 3D [2] 00FF");
    }

    #[test]
    fn test_not_available_ranges() {
        assert_eq!(available_u16(0), Some(0));
        assert_eq!(available_u16(0xFAFF), Some(0xFAFF));
        assert_eq!(available_u16(0xFFFF), None);
        assert_eq!(available_u32(0xFFFF_FFFF), None);
    }
}
