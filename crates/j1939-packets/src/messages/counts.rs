//! DM29 regulated DTC counts

use crate::error::{require_len, PacketResult};
use crate::packet::{pgn, DiagnosticMessage, Packet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm29DtcCounts {
    packet: Packet,
}

impl Dm29DtcCounts {
    pub fn create(
        source: u8,
        pending: u8,
        all_pending: u8,
        mil_on: u8,
        previously_mil_on: u8,
        permanent: u8,
    ) -> Self {
        let data = vec![pending, all_pending, mil_on, previously_mil_on, permanent, 0xFF, 0xFF, 0xFF];
        Self {
            packet: Packet::new(pgn::DM29, source, data),
        }
    }

    fn count(&self, index: usize) -> Option<u8> {
        self.packet.get_u8(index).filter(|v| *v != 0xFF)
    }

    pub fn emission_related_pending(&self) -> Option<u8> {
        self.count(0)
    }

    pub fn all_pending(&self) -> Option<u8> {
        self.count(1)
    }

    pub fn emission_related_mil_on(&self) -> Option<u8> {
        self.count(2)
    }

    pub fn emission_related_previously_mil_on(&self) -> Option<u8> {
        self.count(3)
    }

    pub fn emission_related_permanent(&self) -> Option<u8> {
        self.count(4)
    }
}

impl DiagnosticMessage for Dm29DtcCounts {
    const PGN: u32 = pgn::DM29;
    const NAME: &'static str = "DM29";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 5)?;
        Ok(Self { packet })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let dm29 = Dm29DtcCounts::create(0, 1, 2, 0, 3, 0xFF);
        assert_eq!(dm29.emission_related_pending(), Some(1));
        assert_eq!(dm29.all_pending(), Some(2));
        assert_eq!(dm29.emission_related_mil_on(), Some(0));
        assert_eq!(dm29.emission_related_previously_mil_on(), Some(3));
        assert_eq!(dm29.emission_related_permanent(), None);
    }
}
