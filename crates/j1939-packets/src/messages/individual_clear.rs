//! DM22 individual clear/reset of active and previously active DTC
//!
//! The same eight-byte layout carries the request and the module's answer:
//!
//! ```text
//! byte 0     control byte
//! byte 1     acknowledgement code (NACK answers only, 0xFF otherwise)
//! bytes 2-4  reserved, 0xFF
//! bytes 5-7  SPN (19 bits) and FMI of the DTC to clear
//! ```

use std::fmt;

use serde::Serialize;

use crate::dtc::{spn_bytes, spn_from_bytes};
use crate::error::{require_len, PacketResult};
use crate::packet::{pgn, DiagnosticMessage, Packet};

/// DM22 control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dm22Control {
    /// Request to clear/reset a previously active DTC
    ClrPaReq,
    ClrPaAck,
    ClrPaNack,
    /// Request to clear/reset an active DTC
    ClrActReq,
    ClrActAck,
    ClrActNack,
    Unknown(u8),
}

impl From<u8> for Dm22Control {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Dm22Control::ClrPaReq,
            0x02 => Dm22Control::ClrPaAck,
            0x03 => Dm22Control::ClrPaNack,
            0x11 => Dm22Control::ClrActReq,
            0x12 => Dm22Control::ClrActAck,
            0x13 => Dm22Control::ClrActNack,
            other => Dm22Control::Unknown(other),
        }
    }
}

impl From<Dm22Control> for u8 {
    fn from(value: Dm22Control) -> Self {
        match value {
            Dm22Control::ClrPaReq => 0x01,
            Dm22Control::ClrPaAck => 0x02,
            Dm22Control::ClrPaNack => 0x03,
            Dm22Control::ClrActReq => 0x11,
            Dm22Control::ClrActAck => 0x12,
            Dm22Control::ClrActNack => 0x13,
            Dm22Control::Unknown(other) => other,
        }
    }
}

impl fmt::Display for Dm22Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dm22Control::ClrPaReq => f.write_str("CLR_PA_REQ"),
            Dm22Control::ClrPaAck => f.write_str("CLR_PA_ACK"),
            Dm22Control::ClrPaNack => f.write_str("CLR_PA_NACK"),
            Dm22Control::ClrActReq => f.write_str("CLR_ACT_REQ"),
            Dm22Control::ClrActAck => f.write_str("CLR_ACT_ACK"),
            Dm22Control::ClrActNack => f.write_str("CLR_ACT_NACK"),
            Dm22Control::Unknown(v) => write!(f, "Unknown({})", v),
        }
    }
}

/// Reason given with a CLR_PA_NACK or CLR_ACT_NACK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dm22AckCode {
    GeneralNack,
    AccessDenied,
    UnknownDtc,
    NotPreviouslyActive,
    NotActive,
    NotAvailable,
    Other(u8),
}

impl From<u8> for Dm22AckCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Dm22AckCode::GeneralNack,
            1 => Dm22AckCode::AccessDenied,
            2 => Dm22AckCode::UnknownDtc,
            3 => Dm22AckCode::NotPreviouslyActive,
            4 => Dm22AckCode::NotActive,
            0xFF => Dm22AckCode::NotAvailable,
            other => Dm22AckCode::Other(other),
        }
    }
}

impl From<Dm22AckCode> for u8 {
    fn from(value: Dm22AckCode) -> Self {
        match value {
            Dm22AckCode::GeneralNack => 0,
            Dm22AckCode::AccessDenied => 1,
            Dm22AckCode::UnknownDtc => 2,
            Dm22AckCode::NotPreviouslyActive => 3,
            Dm22AckCode::NotActive => 4,
            Dm22AckCode::NotAvailable => 0xFF,
            Dm22AckCode::Other(other) => other,
        }
    }
}

/// DM22 request or answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dm22IndividualClear {
    packet: Packet,
}

impl Dm22IndividualClear {
    pub fn create(source: u8, control: Dm22Control, ack_code: Dm22AckCode, spn: u32, fmi: u8) -> Self {
        let [s0, s1, s2] = spn_bytes(spn, fmi);
        let data = vec![
            u8::from(control),
            u8::from(ack_code),
            0xFF,
            0xFF,
            0xFF,
            s0,
            s1,
            s2,
        ];
        Self {
            packet: Packet::new(pgn::DM22, source, data),
        }
    }

    /// A clear request; requests carry no acknowledgement code
    pub fn request(source: u8, control: Dm22Control, spn: u32, fmi: u8) -> Self {
        Self::create(source, control, Dm22AckCode::NotAvailable, spn, fmi)
    }

    pub fn control(&self) -> Dm22Control {
        Dm22Control::from(self.packet.bytes()[0])
    }

    pub fn ack_code(&self) -> Dm22AckCode {
        Dm22AckCode::from(self.packet.bytes()[1])
    }

    /// A negative answer (either kind) with acknowledgement code 0
    pub fn is_general_nack(&self) -> bool {
        matches!(self.control(), Dm22Control::ClrPaNack | Dm22Control::ClrActNack)
            && self.ack_code() == Dm22AckCode::GeneralNack
    }

    pub fn spn(&self) -> u32 {
        let data = self.packet.bytes();
        spn_from_bytes([data[5], data[6], data[7]])
    }

    pub fn fmi(&self) -> u8 {
        self.packet.bytes()[7] & 0x1F
    }
}

impl DiagnosticMessage for Dm22IndividualClear {
    const PGN: u32 = pgn::DM22;
    const NAME: &'static str = "DM22";

    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 8)?;
        Ok(Self { packet })
    }

    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl fmt::Display for Dm22IndividualClear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DM22 from {}: {}, SPN {} FMI {}",
            self.module_name(),
            self.control(),
            self.spn(),
            self.fmi()
        )
    }
}
