//! Freeze frames: a DTC plus the parameter samples captured when it was set
//!
//! Layout: `[total length][DTC (4 bytes)][parameter samples]` where the total
//! length counts the DTC and the samples but not itself.

use std::fmt;

use crate::dtc::{DiagnosticTroubleCode, DTC_LEN};
use crate::error::{PacketError, PacketResult};

/// Decoded view of one suspect parameter inside a freeze frame
#[derive(Debug, Clone, PartialEq)]
pub struct Spn {
    pub id: u32,
    pub data: Vec<u8>,
    /// Scaled value, when the decoding metadata knows how to scale it
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Spn {
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self {
            id,
            data,
            value: None,
            unit: None,
        }
    }

    pub fn with_value(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.value = Some(value);
        self.unit = Some(unit.into());
        self
    }
}

impl fmt::Display for Spn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.value, &self.unit) {
            (Some(value), Some(unit)) => write!(f, "SPN {:>6}: {} {}", self.id, value, unit),
            (Some(value), None) => write!(f, "SPN {:>6}: {}", self.id, value),
            _ => write!(f, "SPN {:>6}: {}", self.id, hex::encode_upper(&self.data)),
        }
    }
}

/// A freeze frame. Raw bytes are fixed at construction; decoded [`Spn`] views
/// are attached later with [`FreezeFrame::set_spns`].
#[derive(Debug, Clone, PartialEq)]
pub struct FreezeFrame {
    dtc: DiagnosticTroubleCode,
    spn_data: Vec<u8>,
    spns: Vec<Spn>,
}

impl FreezeFrame {
    /// Largest sample payload that still fits the one-byte length prefix
    pub const MAX_SPN_DATA: usize = u8::MAX as usize - DTC_LEN;

    pub fn new(dtc: DiagnosticTroubleCode, spn_data: Vec<u8>) -> PacketResult<Self> {
        if spn_data.len() > Self::MAX_SPN_DATA {
            return Err(PacketError::InvalidData(format!(
                "{} bytes of parameter data do not fit a freeze frame",
                spn_data.len()
            )));
        }
        Ok(Self {
            dtc,
            spn_data,
            spns: Vec::new(),
        })
    }

    /// Build from already-decoded parameters; their raw bytes become the sample data
    pub fn from_spns(dtc: DiagnosticTroubleCode, spns: Vec<Spn>) -> PacketResult<Self> {
        let data = spns.iter().flat_map(|s| s.data.iter().copied()).collect();
        let mut frame = Self::new(dtc, data)?;
        frame.spns = spns;
        Ok(frame)
    }

    /// Decode exactly one freeze frame. The length prefix must equal the
    /// number of bytes that follow it.
    pub fn decode(data: &[u8]) -> PacketResult<Self> {
        let declared = *data.first().ok_or(PacketError::TooShort {
            expected: 1 + DTC_LEN,
            actual: 0,
        })? as usize;
        let actual = data.len() - 1;
        if declared != actual {
            return Err(PacketError::LengthMismatch { declared, actual });
        }
        Self::decode_body(&data[1..])
    }

    /// Decode a body (DTC + samples) whose length was already validated
    pub(crate) fn decode_body(body: &[u8]) -> PacketResult<Self> {
        let dtc = DiagnosticTroubleCode::from_slice(body)?;
        Self::new(dtc, body[DTC_LEN..].to_vec())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        // new() keeps this within u8
        out.push((DTC_LEN + self.spn_data.len()) as u8);
        out.extend_from_slice(&self.dtc.to_bytes());
        out.extend_from_slice(&self.spn_data);
        out
    }

    /// Total encoded size, length prefix included
    pub fn encoded_len(&self) -> usize {
        1 + DTC_LEN + self.spn_data.len()
    }

    pub fn dtc(&self) -> &DiagnosticTroubleCode {
        &self.dtc
    }

    pub fn spn_data(&self) -> &[u8] {
        &self.spn_data
    }

    pub fn spns(&self) -> &[Spn] {
        &self.spns
    }

    pub fn set_spns(&mut self, spns: Vec<Spn>) {
        self.spns = spns;
    }

    pub fn spn(&self, id: u32) -> Option<&Spn> {
        self.spns.iter().find(|s| s.id == id)
    }
}

impl fmt::Display for FreezeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Freeze Frame: {{")?;
        writeln!(f, "{}", self.dtc)?;
        let data: Vec<String> = self.spn_data.iter().map(|b| format!("{:02X}", b)).collect();
        writeln!(f, "SPN Data: {}", data.join(" "))?;
        let mut spns: Vec<&Spn> = self.spns.iter().collect();
        spns.sort_by_key(|s| s.id);
        for spn in spns {
            writeln!(f, "{}", spn)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dtc() -> DiagnosticTroubleCode {
        DiagnosticTroubleCode::new(102, 4, 1, 0).unwrap()
    }

    #[test]
    fn test_encoded_length() {
        let samples = vec![0x10, 0x20, 0x30, 0x40, 0x50];
        let frame = FreezeFrame::new(dtc(), samples.clone()).unwrap();
        let encoded = frame.encode();

        assert_eq!(encoded[0] as usize, DTC_LEN + samples.len());
        assert_eq!(encoded.len(), 1 + DTC_LEN + samples.len());

        let decoded = FreezeFrame::decode(&encoded).unwrap();
        assert_eq!(decoded.encoded_len(), 1 + DTC_LEN + samples.len());
        assert_eq!(decoded.dtc(), &dtc());
        assert_eq!(decoded.spn_data(), samples.as_slice());
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut encoded = FreezeFrame::new(dtc(), vec![1, 2, 3]).unwrap().encode();
        encoded.push(0xAA);
        assert_eq!(
            FreezeFrame::decode(&encoded),
            Err(PacketError::LengthMismatch {
                declared: 7,
                actual: 8
            })
        );

        encoded.truncate(5);
        assert!(matches!(
            FreezeFrame::decode(&encoded),
            Err(PacketError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            FreezeFrame::decode(&[]),
            Err(PacketError::TooShort { .. })
        ));
    }

    #[test]
    fn test_spns_attached_after_construction() {
        let mut frame = FreezeFrame::new(dtc(), vec![0x80, 0x3E]).unwrap();
        assert!(frame.spns().is_empty());

        frame.set_spns(vec![Spn::new(190, vec![0x80, 0x3E]).with_value(2000.0, "rpm")]);
        assert_eq!(frame.spn(190).and_then(|s| s.value), Some(2000.0));
        assert!(frame.spn(91).is_none());
        // raw capture is untouched
        assert_eq!(frame.spn_data(), &[0x80, 0x3E]);
    }

    #[test]
    fn test_from_spns_concatenates_data() {
        let frame = FreezeFrame::from_spns(
            dtc(),
            vec![Spn::new(190, vec![0x80, 0x3E]), Spn::new(110, vec![0x7D])],
        )
        .unwrap();
        assert_eq!(frame.spn_data(), &[0x80, 0x3E, 0x7D]);
        assert_eq!(frame.spns().len(), 2);
    }

    #[test]
    fn test_oversized_samples_rejected() {
        let samples = vec![0; FreezeFrame::MAX_SPN_DATA + 1];
        assert!(FreezeFrame::new(dtc(), samples).is_err());
    }
}
