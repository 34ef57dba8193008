//! DM20 monitor performance ratio

use crate::dtc::{spn_bytes, spn_from_bytes};
use crate::error::{require_len, PacketError, PacketResult};
use crate::packet::{available_u16, pgn, DiagnosticMessage, Packet};

const RATIO_LEN: usize = 7;

/// One monitor's in-use performance ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceRatio {
    pub spn: u32,
    pub numerator: u16,
    pub denominator: u16,
}

impl PerformanceRatio {
    fn to_bytes(self) -> [u8; RATIO_LEN] {
        let n = self.numerator.to_le_bytes();
        let d = self.denominator.to_le_bytes();
        let spn = spn_bytes(self.spn, 0x1F);
        [
            spn[0],
            spn[1],
            spn[2],
            n[0],
            n[1],
            d[0],
            d[1],
        ]
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            spn: spn_from_bytes([b[0], b[1], b[2]]),
            numerator: u16::from_le_bytes([b[3], b[4]]),
            denominator: u16::from_le_bytes([b[5], b[6]]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm20MonitorPerformanceRatio {
    packet: Packet,
    ratios: Vec<PerformanceRatio>,
}

impl Dm20MonitorPerformanceRatio {
    pub fn create(source: u8, ignition_cycles: u16, obd_conditions: u16, ratios: &[PerformanceRatio]) -> Self {
        let mut data = Vec::with_capacity(4 + ratios.len() * RATIO_LEN);
        data.extend_from_slice(&ignition_cycles.to_le_bytes());
        data.extend_from_slice(&obd_conditions.to_le_bytes());
        for ratio in ratios {
            data.extend_from_slice(&ratio.to_bytes());
        }
        Self {
            packet: Packet::new(pgn::DM20, source, data),
            ratios: ratios.to_vec(),
        }
    }

    /// SPN 3048
    pub fn ignition_cycles(&self) -> Option<u16> {
        self.packet.get_u16(0).and_then(available_u16)
    }

    /// SPN 3049
    pub fn obd_monitoring_conditions_encountered(&self) -> Option<u16> {
        self.packet.get_u16(2).and_then(available_u16)
    }

    pub fn ratios(&self) -> &[PerformanceRatio] {
        &self.ratios
    }
}

impl DiagnosticMessage for Dm20MonitorPerformanceRatio {
    const PGN: u32 = pgn::DM20;
    const NAME: &'static str = "DM20";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 4)?;
        let body = &packet.bytes()[4..];
        if body.len() % RATIO_LEN != 0 {
            return Err(PacketError::InvalidData(format!(
                "{} trailing bytes do not form whole ratios",
                body.len() % RATIO_LEN
            )));
        }
        let ratios = body.chunks_exact(RATIO_LEN).map(PerformanceRatio::from_bytes).collect();
        Ok(Self { packet, ratios })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios() {
        let ratio = PerformanceRatio {
            spn: 5322,
            numerator: 3,
            denominator: 10,
        };
        let dm20 = Dm20MonitorPerformanceRatio::create(0, 42, 17, &[ratio]);
        let decoded = Dm20MonitorPerformanceRatio::from_packet(dm20.packet().clone()).unwrap();
        assert_eq!(decoded.ignition_cycles(), Some(42));
        assert_eq!(decoded.obd_monitoring_conditions_encountered(), Some(17));
        assert_eq!(decoded.ratios(), &[ratio]);
    }

    #[test]
    fn test_partial_ratio_rejected() {
        let packet = Packet::new(pgn::DM20, 0, vec![1, 0, 1, 0, 0xAA, 0xBB]);
        assert!(matches!(
            Dm20MonitorPerformanceRatio::from_packet(packet),
            Err(PacketError::InvalidData(_))
        ));
    }
}
