//! DM31 DTC to lamp association

use crate::dtc::{DiagnosticTroubleCode, LampStatus, DTC_LEN};
use crate::error::PacketResult;
use crate::packet::{pgn, DiagnosticMessage, Packet};

const RECORD_LEN: usize = DTC_LEN + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtcLampStatus {
    pub dtc: DiagnosticTroubleCode,
    pub mil: LampStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm31DtcToLampAssociation {
    packet: Packet,
    records: Vec<DtcLampStatus>,
}

impl Dm31DtcToLampAssociation {
    pub fn create(source: u8, records: &[DtcLampStatus]) -> Self {
        let mut data = Vec::with_capacity(records.len() * RECORD_LEN);
        for record in records {
            data.extend_from_slice(&record.dtc.to_bytes());
            data.push(record.mil.to_bits() << 6);
            data.push(0xFF);
        }
        if data.is_empty() {
            data = vec![0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF];
        }
        Self {
            packet: Packet::new(pgn::DM31, source, data),
            records: records.to_vec(),
        }
    }

    pub fn dtc_lamp_statuses(&self) -> &[DtcLampStatus] {
        &self.records
    }
}

impl DiagnosticMessage for Dm31DtcToLampAssociation {
    const PGN: u32 = pgn::DM31;
    const NAME: &'static str = "DM31";

    fn decode(packet: Packet) -> PacketResult<Self> {
        let records = packet
            .bytes()
            .chunks_exact(RECORD_LEN)
            .map(|chunk| DtcLampStatus {
                dtc: DiagnosticTroubleCode::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                mil: LampStatus::from_bits(chunk[4] >> 6),
            })
            .filter(|r| !r.dtc.is_placeholder())
            .collect();
        Ok(Self { packet, records })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records() {
        let record = DtcLampStatus {
            dtc: DiagnosticTroubleCode::new(609, 19, 1, 0).unwrap(),
            mil: LampStatus::On,
        };
        let dm31 = Dm31DtcToLampAssociation::create(0x3D, &[record]);
        let decoded = Dm31DtcToLampAssociation::from_packet(dm31.packet().clone()).unwrap();
        assert_eq!(decoded.dtc_lamp_statuses(), &[record]);
    }

    #[test]
    fn test_empty() {
        let dm31 = Dm31DtcToLampAssociation::create(0, &[]);
        let decoded = Dm31DtcToLampAssociation::from_packet(dm31.packet().clone()).unwrap();
        assert!(decoded.dtc_lamp_statuses().is_empty());
    }
}
