//! Diagnostic readiness messages (DM5, DM21, DM26)

use crate::error::{require_len, PacketResult};
use crate::monitor::{
    decode_monitor_block, encode_monitor_block, CompositeSystem, DiagnosticReadiness,
    MonitorStatus, MonitoredSystem, MONITOR_BLOCK_LEN, MONITOR_BLOCK_OFFSET,
};
use crate::packet::{available_u16, pgn, DiagnosticMessage, Packet};

fn monitor_block(data: &[u8]) -> [u8; MONITOR_BLOCK_LEN] {
    let mut block = [0u8; MONITOR_BLOCK_LEN];
    block.copy_from_slice(&data[MONITOR_BLOCK_OFFSET..MONITOR_BLOCK_OFFSET + MONITOR_BLOCK_LEN]);
    block
}

/// DM5 diagnostic readiness 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm5DiagnosticReadiness {
    packet: Packet,
    active_count: u8,
    previously_active_count: u8,
    obd_compliance: u8,
    monitors: Vec<MonitoredSystem>,
}

impl Dm5DiagnosticReadiness {
    pub fn create(
        source: u8,
        active_count: u8,
        previously_active_count: u8,
        obd_compliance: u8,
        monitors: &[(CompositeSystem, MonitorStatus)],
    ) -> Self {
        let mut data = vec![active_count, previously_active_count, obd_compliance];
        data.extend_from_slice(&encode_monitor_block(monitors));
        // encoding a well-formed block cannot fail to decode
        let packet = Packet::new(pgn::DM5, source, data);
        let block = monitor_block(packet.bytes());
        Self {
            monitors: decode_monitor_block(&block, source),
            packet,
            active_count,
            previously_active_count,
            obd_compliance,
        }
    }

    pub fn active_count(&self) -> u8 {
        self.active_count
    }

    pub fn previously_active_count(&self) -> u8 {
        self.previously_active_count
    }

    pub fn obd_compliance(&self) -> u8 {
        self.obd_compliance
    }

    /// OBD compliance values 5 and 255 mean "not intended to meet OBD requirements"
    pub fn is_obd(&self) -> bool {
        self.obd_compliance != 5 && self.obd_compliance != 0xFF
    }
}

impl DiagnosticReadiness for Dm5DiagnosticReadiness {
    fn monitored_systems(&self) -> &[MonitoredSystem] {
        &self.monitors
    }
}

impl DiagnosticMessage for Dm5DiagnosticReadiness {
    const PGN: u32 = pgn::DM5;
    const NAME: &'static str = "DM5";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), MONITOR_BLOCK_OFFSET + MONITOR_BLOCK_LEN)?;
        let data = packet.bytes();
        let monitors = decode_monitor_block(&monitor_block(data), packet.source_address());
        Ok(Self {
            active_count: data[0],
            previously_active_count: data[1],
            obd_compliance: data[2],
            monitors,
            packet,
        })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

/// DM26 diagnostic readiness 3 (monitors for the current drive cycle)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm26TripDiagnosticReadiness {
    packet: Packet,
    time_since_engine_start: u16,
    warm_ups_since_clear: u8,
    monitors: Vec<MonitoredSystem>,
}

impl Dm26TripDiagnosticReadiness {
    pub fn create(
        source: u8,
        time_since_engine_start: u16,
        warm_ups_since_clear: u8,
        monitors: &[(CompositeSystem, MonitorStatus)],
    ) -> Self {
        let mut data = time_since_engine_start.to_le_bytes().to_vec();
        data.push(warm_ups_since_clear);
        data.extend_from_slice(&encode_monitor_block(monitors));
        let packet = Packet::new(pgn::DM26, source, data);
        let block = monitor_block(packet.bytes());
        Self {
            monitors: decode_monitor_block(&block, source),
            packet,
            time_since_engine_start,
            warm_ups_since_clear,
        }
    }

    /// Seconds since engine start
    pub fn time_since_engine_start(&self) -> Option<u16> {
        available_u16(self.time_since_engine_start)
    }

    pub fn warm_ups_since_clear(&self) -> u8 {
        self.warm_ups_since_clear
    }
}

impl DiagnosticReadiness for Dm26TripDiagnosticReadiness {
    fn monitored_systems(&self) -> &[MonitoredSystem] {
        &self.monitors
    }
}

impl DiagnosticMessage for Dm26TripDiagnosticReadiness {
    const PGN: u32 = pgn::DM26;
    const NAME: &'static str = "DM26";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), MONITOR_BLOCK_OFFSET + MONITOR_BLOCK_LEN)?;
        let data = packet.bytes();
        let monitors = decode_monitor_block(&monitor_block(data), packet.source_address());
        Ok(Self {
            time_since_engine_start: u16::from_le_bytes([data[0], data[1]]),
            warm_ups_since_clear: data[2],
            monitors,
            packet,
        })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

/// DM21 diagnostic readiness 2: distance and time with MIL on / since clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm21DiagnosticReadiness {
    packet: Packet,
}

impl Dm21DiagnosticReadiness {
    /// Raw values; 0xFFFF means not supported
    pub fn create(
        source: u8,
        km_while_mil_on: u16,
        km_since_dtcs_cleared: u16,
        minutes_while_mil_on: u16,
        minutes_since_dtcs_cleared: u16,
    ) -> Self {
        let mut data = Vec::with_capacity(8);
        for value in [
            km_while_mil_on,
            km_since_dtcs_cleared,
            minutes_while_mil_on,
            minutes_since_dtcs_cleared,
        ] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self {
            packet: Packet::new(pgn::DM21, source, data),
        }
    }

    fn value(&self, index: usize) -> Option<u16> {
        self.packet.get_u16(index).and_then(available_u16)
    }

    /// SPN 3069
    pub fn km_while_mil_on(&self) -> Option<u16> {
        self.value(0)
    }

    /// SPN 3294
    pub fn km_since_dtcs_cleared(&self) -> Option<u16> {
        self.value(2)
    }

    /// SPN 3295
    pub fn minutes_while_mil_on(&self) -> Option<u16> {
        self.value(4)
    }

    /// SPN 3296
    pub fn minutes_since_dtcs_cleared(&self) -> Option<u16> {
        self.value(6)
    }
}

impl DiagnosticMessage for Dm21DiagnosticReadiness {
    const PGN: u32 = pgn::DM21;
    const NAME: &'static str = "DM21";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 8)?;
        Ok(Self { packet })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}
