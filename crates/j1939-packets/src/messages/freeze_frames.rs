//! DM25 expanded freeze frame

use crate::dtc::DTC_LEN;
use crate::error::{PacketError, PacketResult};
use crate::freeze_frame::FreezeFrame;
use crate::packet::{pgn, DiagnosticMessage, Packet};

/// Payload sent when a module has no freeze frames stored
const NO_FREEZE_FRAMES: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF];

#[derive(Debug, Clone, PartialEq)]
pub struct Dm25ExpandedFreezeFrame {
    packet: Packet,
    frames: Vec<FreezeFrame>,
}

impl Dm25ExpandedFreezeFrame {
    pub fn create(source: u8, frames: Vec<FreezeFrame>) -> Self {
        let data = if frames.is_empty() {
            NO_FREEZE_FRAMES.to_vec()
        } else {
            frames.iter().flat_map(|f| f.encode()).collect()
        };
        Self {
            packet: Packet::new(pgn::DM25, source, data),
            frames,
        }
    }

    pub fn freeze_frames(&self) -> &[FreezeFrame] {
        &self.frames
    }
}

/// Split a DM25 payload into freeze frames. A zero length byte or a tail of
/// 0xFF fill ends the list. 0xFF is otherwise a valid length; every length
/// must fit in the remaining bytes.
fn parse_freeze_frames(data: &[u8]) -> PacketResult<Vec<FreezeFrame>> {
    if data == NO_FREEZE_FRAMES {
        return Ok(Vec::new());
    }
    let mut frames = Vec::new();
    let mut index = 0;
    while index < data.len() {
        let declared = data[index] as usize;
        let remaining = data.len() - index - 1;
        if declared == 0 || (declared > remaining && data[index..].iter().all(|b| *b == 0xFF)) {
            break;
        }
        if declared < DTC_LEN || declared > remaining {
            return Err(PacketError::LengthMismatch {
                declared,
                actual: remaining,
            });
        }
        frames.push(FreezeFrame::decode_body(&data[index + 1..index + 1 + declared])?);
        index += 1 + declared;
    }
    Ok(frames)
}

impl DiagnosticMessage for Dm25ExpandedFreezeFrame {
    const PGN: u32 = pgn::DM25;
    const NAME: &'static str = "DM25";

    fn decode(packet: Packet) -> PacketResult<Self> {
        let frames = parse_freeze_frames(packet.bytes())?;
        Ok(Self { packet, frames })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}
