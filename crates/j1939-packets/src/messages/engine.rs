//! Engine run-time counters (engine hours, idle operation)

use crate::error::{require_len, PacketResult};
use crate::packet::{available_u32, pgn, DiagnosticMessage, Packet};

/// Resolution of the hour counters, hours per bit
pub const HOURS_PER_BIT: f64 = 0.05;

/// Engine hours, revolutions (PGN 65253)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHours {
    packet: Packet,
}

impl EngineHours {
    pub fn create(source: u8, total_hours_raw: u32, total_revolutions_raw: u32) -> Self {
        let mut data = total_hours_raw.to_le_bytes().to_vec();
        data.extend_from_slice(&total_revolutions_raw.to_le_bytes());
        Self {
            packet: Packet::new(pgn::ENGINE_HOURS, source, data),
        }
    }

    /// SPN 247 raw counter
    pub fn total_hours_raw(&self) -> Option<u32> {
        self.packet.get_u32(0).and_then(available_u32)
    }

    pub fn total_hours(&self) -> Option<f64> {
        self.total_hours_raw().map(|raw| raw as f64 * HOURS_PER_BIT)
    }

    /// SPN 249, units of 1000 revolutions
    pub fn total_revolutions_raw(&self) -> Option<u32> {
        self.packet.get_u32(4).and_then(available_u32)
    }
}

impl DiagnosticMessage for EngineHours {
    const PGN: u32 = pgn::ENGINE_HOURS;
    const NAME: &'static str = "Engine Hours";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 8)?;
        Ok(Self { packet })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

/// Idle operation (PGN 65244)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleOperation {
    packet: Packet,
}

impl IdleOperation {
    pub fn create(source: u8, idle_fuel_raw: u32, idle_hours_raw: u32) -> Self {
        let mut data = idle_fuel_raw.to_le_bytes().to_vec();
        data.extend_from_slice(&idle_hours_raw.to_le_bytes());
        Self {
            packet: Packet::new(pgn::IDLE_OPERATION, source, data),
        }
    }

    /// SPN 236 raw counter, 0.5 L per bit
    pub fn total_idle_fuel_raw(&self) -> Option<u32> {
        self.packet.get_u32(0).and_then(available_u32)
    }

    /// SPN 235 raw counter
    pub fn total_idle_hours_raw(&self) -> Option<u32> {
        self.packet.get_u32(4).and_then(available_u32)
    }

    pub fn total_idle_hours(&self) -> Option<f64> {
        self.total_idle_hours_raw().map(|raw| raw as f64 * HOURS_PER_BIT)
    }
}

impl DiagnosticMessage for IdleOperation {
    const PGN: u32 = pgn::IDLE_OPERATION;
    const NAME: &'static str = "Idle Operation";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 8)?;
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
    fn test_engine_hours() {
        let hours = EngineHours::create(0, 2000, u32::MAX);
        assert_eq!(hours.total_hours_raw(), Some(2000));
        assert_eq!(hours.total_hours(), Some(100.0));
        assert_eq!(hours.total_revolutions_raw(), None);
    }

    #[test]
    fn test_idle_operation() {
        let idle = IdleOperation::create(0, 10, 40);
        let decoded = IdleOperation::from_packet(idle.packet().clone()).unwrap();
        assert_eq!(decoded.total_idle_fuel_raw(), Some(10));
        assert_eq!(decoded.total_idle_hours(), Some(2.0));
    }
}
