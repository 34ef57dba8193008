//! Messages carrying lamp status followed by a list of DTCs
//! (DM1, DM2, DM6, DM12, DM23, DM28)

use crate::dtc::{parse_dtcs, DiagnosticTroubleCode, LampStatus, DTC_LEN};
use crate::error::{require_len, PacketResult};
use crate::packet::{pgn, DiagnosticMessage, Packet};

/// Shared decoded body of the DTC list messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DtcList {
    packet: Packet,
    mil: LampStatus,
    dtcs: Vec<DiagnosticTroubleCode>,
}

impl DtcList {
    fn decode(packet: Packet) -> PacketResult<Self> {
        require_len(packet.bytes(), 2)?;
        let data = packet.bytes();
        let mil = LampStatus::from_bits(data[0] >> 6);
        let dtcs = parse_dtcs(&data[2..]);
        Ok(Self { packet, mil, dtcs })
    }

    /// Encode lamps and DTCs; an empty list is sent as the all-zero placeholder
    fn encode(pgn: u32, source: u8, mil: LampStatus, dtcs: &[DiagnosticTroubleCode]) -> Packet {
        let mut data = vec![mil.to_bits() << 6, 0xFF];
        if dtcs.is_empty() {
            data.extend_from_slice(&[0; DTC_LEN]);
        }
        for dtc in dtcs {
            data.extend_from_slice(&dtc.to_bytes());
        }
        while data.len() < 8 {
            data.push(0xFF);
        }
        Packet::new(pgn, source, data)
    }

    pub fn mil_status(&self) -> LampStatus {
        self.mil
    }

    pub fn dtcs(&self) -> &[DiagnosticTroubleCode] {
        &self.dtcs
    }
}

macro_rules! dtc_list_message {
    ($(#[$doc:meta])* $name:ident, $pgn:expr, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(DtcList);

        impl $name {
            pub fn create(source: u8, mil: LampStatus, dtcs: &[DiagnosticTroubleCode]) -> Self {
                let packet = DtcList::encode($pgn, source, mil, dtcs);
                Self(DtcList {
                    packet,
                    mil,
                    dtcs: dtcs.to_vec(),
                })
            }

            pub fn mil_status(&self) -> LampStatus {
                self.0.mil_status()
            }

            pub fn dtcs(&self) -> &[DiagnosticTroubleCode] {
                self.0.dtcs()
            }

            pub fn has_dtcs(&self) -> bool {
                !self.0.dtcs.is_empty()
            }
        }

        impl DiagnosticMessage for $name {
            const PGN: u32 = $pgn;
            const NAME: &'static str = $label;

            fn decode(packet: Packet) -> PacketResult<Self> {
                DtcList::decode(packet).map(Self)
            }

            fn packet(&self) -> &Packet {
                &self.0.packet
            }
        }
    };
}

dtc_list_message!(
    /// DM1 active DTCs
    Dm1ActiveDtcs, pgn::DM1, "DM1"
);
dtc_list_message!(
    /// DM2 previously active DTCs
    Dm2PreviouslyActiveDtcs, pgn::DM2, "DM2"
);
dtc_list_message!(
    /// DM6 emission-related pending DTCs
    Dm6PendingDtcs, pgn::DM6, "DM6"
);
dtc_list_message!(
    /// DM12 emission-related active (MIL on) DTCs
    Dm12MilOnDtcs, pgn::DM12, "DM12"
);
dtc_list_message!(
    /// DM23 previously MIL-on DTCs
    Dm23PreviouslyMilOnDtcs, pgn::DM23, "DM23"
);
dtc_list_message!(
    /// DM28 permanent DTCs
    Dm28PermanentDtcs, pgn::DM28, "DM28"
);
