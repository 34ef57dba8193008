//! DTC (Diagnostic Trouble Code) handling per SAE J1939-73
//!
//! A DTC is four bytes on the wire:
//!
//! ```text
//! byte 0   SPN bits 0-7
//! byte 1   SPN bits 8-15
//! byte 2   SPN bits 16-18 (high three bits) | FMI (low five bits)
//! byte 3   conversion method (bit 7) | occurrence count (bits 0-6)
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::{PacketError, PacketResult};

/// Encoded size of one DTC
pub const DTC_LEN: usize = 4;

/// Largest SPN representable in 19 bits
pub const MAX_SPN: u32 = 0x7FFFF;

/// Pack a 19-bit SPN into three bytes. The low five bits of the third byte
/// carry `low_bits` (the FMI in a DTC).
pub fn spn_bytes(spn: u32, low_bits: u8) -> [u8; 3] {
    [
        (spn & 0xFF) as u8,
        ((spn >> 8) & 0xFF) as u8,
        (((spn >> 11) & 0xE0) as u8) | (low_bits & 0x1F),
    ]
}

/// The SPN packed by [`spn_bytes`]
pub fn spn_from_bytes(bytes: [u8; 3]) -> u32 {
    (bytes[0] as u32) | ((bytes[1] as u32) << 8) | (((bytes[2] & 0xE0) as u32) << 11)
}

/// A diagnostic trouble code. Equality is by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DiagnosticTroubleCode {
    /// Suspect parameter number
    pub spn: u32,
    /// Failure mode indicator
    pub fmi: u8,
    /// Occurrence count
    pub occurrence_count: u8,
    /// SPN conversion method bit
    pub conversion_method: u8,
}

impl DiagnosticTroubleCode {
    /// Build a DTC, rejecting fields that do not fit their bit widths
    pub fn new(spn: u32, fmi: u8, occurrence_count: u8, conversion_method: u8) -> PacketResult<Self> {
        if spn > MAX_SPN {
            return Err(PacketError::InvalidData(format!("SPN {} exceeds 19 bits", spn)));
        }
        if fmi > 0x1F {
            return Err(PacketError::InvalidData(format!("FMI {} exceeds 5 bits", fmi)));
        }
        if occurrence_count > 0x7F {
            return Err(PacketError::InvalidData(format!(
                "occurrence count {} exceeds 7 bits",
                occurrence_count
            )));
        }
        if conversion_method > 1 {
            return Err(PacketError::InvalidData(format!(
                "conversion method {} is not a single bit",
                conversion_method
            )));
        }
        Ok(Self {
            spn,
            fmi,
            occurrence_count,
            conversion_method,
        })
    }

    /// Decode from exactly four bytes
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            spn: spn_from_bytes([bytes[0], bytes[1], bytes[2]]),
            fmi: bytes[2] & 0x1F,
            occurrence_count: bytes[3] & 0x7F,
            conversion_method: (bytes[3] >> 7) & 0x01,
        }
    }

    /// Decode from the first four bytes of a slice
    pub fn from_slice(data: &[u8]) -> PacketResult<Self> {
        let bytes: [u8; 4] = data
            .get(..DTC_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(PacketError::TooShort {
                expected: DTC_LEN,
                actual: data.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let [b0, b1, b2] = spn_bytes(self.spn, self.fmi);
        [
            b0,
            b1,
            b2,
            ((self.conversion_method & 0x01) << 7) | (self.occurrence_count & 0x7F),
        ]
    }

    /// SPN 0 / FMI 0 is the "no DTC" placeholder sent when a list is empty
    pub fn is_placeholder(&self) -> bool {
        self.spn == 0 && self.fmi == 0
    }
}

impl fmt::Display for DiagnosticTroubleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DTC {}:{} - SPN {}, FMI {}, {} times",
            self.spn, self.fmi, self.spn, self.fmi, self.occurrence_count
        )
    }
}

/// Decode a run of DTCs, skipping placeholders and 0xFF padding
pub fn parse_dtcs(data: &[u8]) -> Vec<DiagnosticTroubleCode> {
    data.chunks_exact(DTC_LEN)
        .filter(|chunk| chunk.iter().any(|b| *b != 0xFF))
        .map(|chunk| DiagnosticTroubleCode::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .filter(|dtc| !dtc.is_placeholder())
        .collect()
}

/// Two-bit lamp status as carried in DM1/DM2/DM6/DM12/DM23/DM28/DM31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LampStatus {
    Off,
    On,
    Other,
    NotSupported,
}

impl LampStatus {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => LampStatus::Off,
            1 => LampStatus::On,
            2 => LampStatus::Other,
            _ => LampStatus::NotSupported,
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            LampStatus::Off => 0,
            LampStatus::On => 1,
            LampStatus::Other => 2,
            LampStatus::NotSupported => 3,
        }
    }
}

impl fmt::Display for LampStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LampStatus::Off => "off",
            LampStatus::On => "on",
            LampStatus::Other => "other",
            LampStatus::NotSupported => "not supported",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dtc_bytes() {
        // SPN 0x7FFFF uses every SPN bit, FMI 31
        let dtc = DiagnosticTroubleCode::new(0x7FFFF, 31, 5, 0).unwrap();
        assert_eq!(dtc.to_bytes(), [0xFF, 0xFF, 0xFF, 0x05]);
        assert_eq!(DiagnosticTroubleCode::from_bytes(dtc.to_bytes()), dtc);
    }

    #[test]
    fn test_dtc_high_spn_bits() {
        // SPN 520348 = 0x7F09C
        let dtc = DiagnosticTroubleCode::from_bytes([0x9C, 0xF0, 0xE4, 0x81]);
        assert_eq!(dtc.spn, 0x7F09C);
        assert_eq!(dtc.fmi, 4);
        assert_eq!(dtc.occurrence_count, 1);
        assert_eq!(dtc.conversion_method, 1);
    }

    #[test]
    fn test_spn_packing() {
        for (spn, low_bits, bytes) in [
            (0, 0, [0x00, 0x00, 0x00]),
            (102, 4, [0x66, 0x00, 0x04]),
            (0x7F09C, 4, [0x9C, 0xF0, 0xE4]),
            (0x7FFFF, 0x1F, [0xFF, 0xFF, 0xFF]),
        ] {
            assert_eq!(spn_bytes(spn, low_bits), bytes);
            assert_eq!(spn_from_bytes(bytes), spn);
        }
    }

    #[test]
    fn test_dtc_value_equality() {
        let a = DiagnosticTroubleCode::new(123, 12, 0, 1).unwrap();
        let b = DiagnosticTroubleCode::new(123, 12, 0, 1).unwrap();
        let c = DiagnosticTroubleCode::new(123, 12, 1, 1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dtc_rejects_wide_fields() {
        assert!(DiagnosticTroubleCode::new(0x80000, 0, 0, 0).is_err());
        assert!(DiagnosticTroubleCode::new(1, 32, 0, 0).is_err());
        assert!(DiagnosticTroubleCode::new(1, 0, 128, 0).is_err());
        assert!(DiagnosticTroubleCode::new(1, 0, 0, 2).is_err());
    }

    #[test]
    fn test_parse_dtcs_skips_placeholder_and_padding() {
        let data = [
            0x00, 0x00, 0x00, 0x00, // placeholder
            0x7B, 0x00, 0x0C, 0x01, // SPN 123 FMI 12
            0xFF, 0xFF, 0xFF, 0xFF, // padding
            0xFF, 0xFF, // trailing bytes
        ];
        let dtcs = parse_dtcs(&data);
        assert_eq!(dtcs.len(), 1);
        assert_eq!(dtcs[0].spn, 123);
        assert_eq!(dtcs[0].fmi, 12);
    }

    #[test]
    fn test_lamp_status_bits() {
        for status in [
            LampStatus::Off,
            LampStatus::On,
            LampStatus::Other,
            LampStatus::NotSupported,
        ] {
            assert_eq!(LampStatus::from_bits(status.to_bits()), status);
        }
    }
}
