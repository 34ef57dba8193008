//! DM30 scaled test results

use crate::dtc::{spn_bytes, spn_from_bytes};
use crate::error::{PacketError, PacketResult};
use crate::packet::{pgn, DiagnosticMessage, Packet};

const RESULT_LEN: usize = 12;

/// Test value reported for a test not completed since the last clear
pub const TEST_VALUE_INITIALIZED: u16 = 0xFB00;
/// Limit reported for a test not completed since the last clear
pub const TEST_LIMIT_INITIALIZED: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledTestResult {
    pub test_identifier: u8,
    pub spn: u32,
    pub fmi: u8,
    pub slot_identifier: u16,
    pub test_value: u16,
    pub test_maximum: u16,
    pub test_minimum: u16,
}

impl ScaledTestResult {
    /// A result reset by a clear: value 0xFB00, both limits 0xFFFF
    pub fn initialized(test_identifier: u8, spn: u32, fmi: u8, slot_identifier: u16) -> Self {
        Self {
            test_identifier,
            spn,
            fmi,
            slot_identifier,
            test_value: TEST_VALUE_INITIALIZED,
            test_maximum: TEST_LIMIT_INITIALIZED,
            test_minimum: TEST_LIMIT_INITIALIZED,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.test_value == TEST_VALUE_INITIALIZED
            && self.test_maximum == TEST_LIMIT_INITIALIZED
            && self.test_minimum == TEST_LIMIT_INITIALIZED
    }

    fn to_bytes(self) -> [u8; RESULT_LEN] {
        let slot = self.slot_identifier.to_le_bytes();
        let value = self.test_value.to_le_bytes();
        let max = self.test_maximum.to_le_bytes();
        let min = self.test_minimum.to_le_bytes();
        let spn = spn_bytes(self.spn, self.fmi);
        [
            self.test_identifier,
            spn[0],
            spn[1],
            spn[2],
            slot[0],
            slot[1],
            value[0],
            value[1],
            max[0],
            max[1],
            min[0],
            min[1],
        ]
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            test_identifier: b[0],
            spn: spn_from_bytes([b[1], b[2], b[3]]),
            fmi: b[3] & 0x1F,
            slot_identifier: u16::from_le_bytes([b[4], b[5]]),
            test_value: u16::from_le_bytes([b[6], b[7]]),
            test_maximum: u16::from_le_bytes([b[8], b[9]]),
            test_minimum: u16::from_le_bytes([b[10], b[11]]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm30ScaledTestResults {
    packet: Packet,
    results: Vec<ScaledTestResult>,
}

impl Dm30ScaledTestResults {
    pub fn create(source: u8, results: &[ScaledTestResult]) -> Self {
        let data: Vec<u8> = results.iter().flat_map(|r| r.to_bytes()).collect();
        Self {
            packet: Packet::new(pgn::DM30, source, data),
            results: results.to_vec(),
        }
    }

    pub fn test_results(&self) -> &[ScaledTestResult] {
        &self.results
    }
}

impl DiagnosticMessage for Dm30ScaledTestResults {
    const PGN: u32 = pgn::DM30;
    const NAME: &'static str = "DM30";

    fn decode(packet: Packet) -> PacketResult<Self> {
        let data = packet.bytes();
        if data.len() % RESULT_LEN != 0 {
            return Err(PacketError::InvalidData(format!(
                "DM30 length {} is not a multiple of {}",
                data.len(),
                RESULT_LEN
            )));
        }
        let results = data.chunks_exact(RESULT_LEN).map(ScaledTestResult::from_bytes).collect();
        Ok(Self { packet, results })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_decode() {
        let reset = ScaledTestResult::initialized(247, 3226, 18, 8);
        let completed = ScaledTestResult {
            test_value: 0x0100,
            test_maximum: 0x0200,
            test_minimum: 0x0000,
            ..ScaledTestResult::initialized(247, 3031, 16, 8)
        };
        let dm30 = Dm30ScaledTestResults::create(0, &[reset, completed]);
        let decoded = Dm30ScaledTestResults::from_packet(dm30.packet().clone()).unwrap();
        assert_eq!(decoded.test_results(), &[reset, completed]);
        assert!(decoded.test_results()[0].is_initialized());
        assert!(!decoded.test_results()[1].is_initialized());
    }

    #[test]
    fn test_ragged_payload_rejected() {
        let packet = Packet::new(pgn::DM30, 0, vec![0; 13]);
        assert!(Dm30ScaledTestResults::from_packet(packet).is_err());
    }
}
