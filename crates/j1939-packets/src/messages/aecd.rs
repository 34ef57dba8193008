//! DM33 emission increasing auxiliary emission control device active time

use crate::error::{PacketError, PacketResult};
use crate::packet::{available_u32, pgn, DiagnosticMessage, Packet};

const RECORD_LEN: usize = 9;

/// Active time of one EI-AECD, in minutes. `None` timers are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineHoursTimer {
    pub aecd_number: u8,
    pub timer1: Option<u32>,
    pub timer2: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm33EmissionIncreasingAecdActiveTime {
    packet: Packet,
    timers: Vec<EngineHoursTimer>,
}

impl Dm33EmissionIncreasingAecdActiveTime {
    pub fn create(source: u8, timers: &[EngineHoursTimer]) -> Self {
        let mut data = Vec::with_capacity(timers.len() * RECORD_LEN);
        for timer in timers {
            data.push(timer.aecd_number);
            data.extend_from_slice(&timer.timer1.unwrap_or(u32::MAX).to_le_bytes());
            data.extend_from_slice(&timer.timer2.unwrap_or(u32::MAX).to_le_bytes());
        }
        Self {
            packet: Packet::new(pgn::DM33, source, data),
            timers: timers.to_vec(),
        }
    }

    pub fn timers(&self) -> &[EngineHoursTimer] {
        &self.timers
    }
}

impl DiagnosticMessage for Dm33EmissionIncreasingAecdActiveTime {
    const PGN: u32 = pgn::DM33;
    const NAME: &'static str = "DM33";

    fn decode(packet: Packet) -> PacketResult<Self> {
        let data = packet.bytes();
        if data.len() % RECORD_LEN != 0 {
            return Err(PacketError::InvalidData(format!(
                "DM33 length {} is not a multiple of {}",
                data.len(),
                RECORD_LEN
            )));
        }
        let timers = data
            .chunks_exact(RECORD_LEN)
            .map(|c| EngineHoursTimer {
                aecd_number: c[0],
                timer1: available_u32(u32::from_le_bytes([c[1], c[2], c[3], c[4]])),
                timer2: available_u32(u32::from_le_bytes([c[5], c[6], c[7], c[8]])),
            })
            .collect();
        Ok(Self { packet, timers })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}
