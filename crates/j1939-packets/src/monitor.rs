//! Monitored systems reported by the readiness messages (DM5, DM26)
//!
//! Bytes 3-7 of both messages share one layout:
//!
//! ```text
//! byte 3     continuous monitors: support/enable bits 0-2, not-complete bits 4-6
//! bytes 4-5  non-continuous monitors support/enable (little endian bit field)
//! bytes 6-7  non-continuous monitors not-complete   (little endian bit field)
//! ```

use std::fmt;

use serde::Serialize;

/// Offset of the monitor block inside DM5 and DM26
pub const MONITOR_BLOCK_OFFSET: usize = 3;
/// Size of the monitor block
pub const MONITOR_BLOCK_LEN: usize = 5;

/// Composite monitored systems, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeSystem {
    ComprehensiveComponent,
    FuelSystem,
    Misfire,
    EgrVvtSystem,
    ExhaustGasSensorHeater,
    ExhaustGasSensor,
    AcSystemRefrigerant,
    SecondaryAirSystem,
    EvaporativeSystem,
    HeatedCatalyst,
    Catalyst,
    NmhcConvertingCatalyst,
    NoxCatalystAbsorber,
    DieselParticulateFilter,
    BoostPressureControlSystem,
    ColdStartAidSystem,
}

/// Where a system's bits live in the monitor block
enum MonitorBits {
    Continuous(u8),
    NonContinuous(u16),
}

impl CompositeSystem {
    pub const ALL: [CompositeSystem; 16] = [
        CompositeSystem::ComprehensiveComponent,
        CompositeSystem::FuelSystem,
        CompositeSystem::Misfire,
        CompositeSystem::EgrVvtSystem,
        CompositeSystem::ExhaustGasSensorHeater,
        CompositeSystem::ExhaustGasSensor,
        CompositeSystem::AcSystemRefrigerant,
        CompositeSystem::SecondaryAirSystem,
        CompositeSystem::EvaporativeSystem,
        CompositeSystem::HeatedCatalyst,
        CompositeSystem::Catalyst,
        CompositeSystem::NmhcConvertingCatalyst,
        CompositeSystem::NoxCatalystAbsorber,
        CompositeSystem::DieselParticulateFilter,
        CompositeSystem::BoostPressureControlSystem,
        CompositeSystem::ColdStartAidSystem,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CompositeSystem::ComprehensiveComponent => "Comprehensive component",
            CompositeSystem::FuelSystem => "Fuel System",
            CompositeSystem::Misfire => "Misfire",
            CompositeSystem::EgrVvtSystem => "EGR/VVT system",
            CompositeSystem::ExhaustGasSensorHeater => "Exhaust Gas Sensor heater",
            CompositeSystem::ExhaustGasSensor => "Exhaust Gas Sensor",
            CompositeSystem::AcSystemRefrigerant => "A/C system refrigerant",
            CompositeSystem::SecondaryAirSystem => "Secondary air system",
            CompositeSystem::EvaporativeSystem => "Evaporative system",
            CompositeSystem::HeatedCatalyst => "Heated catalyst",
            CompositeSystem::Catalyst => "Catalyst",
            CompositeSystem::NmhcConvertingCatalyst => "NMHC converting catalyst",
            CompositeSystem::NoxCatalystAbsorber => "NOx catalyst/adsorber",
            CompositeSystem::DieselParticulateFilter => "Diesel Particulate Filter",
            CompositeSystem::BoostPressureControlSystem => "Boost pressure control sys",
            CompositeSystem::ColdStartAidSystem => "Cold start aid system",
        }
    }

    /// Continuous monitors run all the time and are normally reported complete
    pub fn is_continuous(&self) -> bool {
        matches!(self.bits(), MonitorBits::Continuous(_))
    }

    fn bits(&self) -> MonitorBits {
        match self {
            CompositeSystem::Misfire => MonitorBits::Continuous(0x01),
            CompositeSystem::FuelSystem => MonitorBits::Continuous(0x02),
            CompositeSystem::ComprehensiveComponent => MonitorBits::Continuous(0x04),
            CompositeSystem::Catalyst => MonitorBits::NonContinuous(0x0001),
            CompositeSystem::HeatedCatalyst => MonitorBits::NonContinuous(0x0002),
            CompositeSystem::EvaporativeSystem => MonitorBits::NonContinuous(0x0004),
            CompositeSystem::SecondaryAirSystem => MonitorBits::NonContinuous(0x0008),
            CompositeSystem::AcSystemRefrigerant => MonitorBits::NonContinuous(0x0010),
            CompositeSystem::ExhaustGasSensor => MonitorBits::NonContinuous(0x0020),
            CompositeSystem::ExhaustGasSensorHeater => MonitorBits::NonContinuous(0x0040),
            CompositeSystem::EgrVvtSystem => MonitorBits::NonContinuous(0x0080),
            CompositeSystem::ColdStartAidSystem => MonitorBits::NonContinuous(0x0100),
            CompositeSystem::BoostPressureControlSystem => MonitorBits::NonContinuous(0x0200),
            CompositeSystem::DieselParticulateFilter => MonitorBits::NonContinuous(0x0400),
            CompositeSystem::NoxCatalystAbsorber => MonitorBits::NonContinuous(0x0800),
            CompositeSystem::NmhcConvertingCatalyst => MonitorBits::NonContinuous(0x1000),
        }
    }
}

impl fmt::Display for CompositeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status of one monitor. For DM5 `enabled` means supported; for DM26 it
/// means enabled for the current drive cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    pub enabled: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitoredSystem {
    pub id: CompositeSystem,
    pub status: MonitorStatus,
    pub source_address: u8,
}

/// Decode the five-byte monitor block
pub fn decode_monitor_block(block: &[u8; MONITOR_BLOCK_LEN], source_address: u8) -> Vec<MonitoredSystem> {
    let continuous = block[0];
    let support = u16::from_le_bytes([block[1], block[2]]);
    let not_complete = u16::from_le_bytes([block[3], block[4]]);

    CompositeSystem::ALL
        .iter()
        .map(|&id| {
            let status = match id.bits() {
                MonitorBits::Continuous(bit) => MonitorStatus {
                    enabled: continuous & bit != 0,
                    complete: continuous & (bit << 4) == 0,
                },
                MonitorBits::NonContinuous(bit) => MonitorStatus {
                    enabled: support & bit != 0,
                    complete: not_complete & bit == 0,
                },
            };
            MonitoredSystem {
                id,
                status,
                source_address,
            }
        })
        .collect()
}

/// Encode a monitor block. Systems not listed are reported unsupported and
/// complete.
pub fn encode_monitor_block(systems: &[(CompositeSystem, MonitorStatus)]) -> [u8; MONITOR_BLOCK_LEN] {
    let mut continuous = 0u8;
    let mut support = 0u16;
    let mut not_complete = 0u16;
    for (id, status) in systems {
        match id.bits() {
            MonitorBits::Continuous(bit) => {
                if status.enabled {
                    continuous |= bit;
                }
                if !status.complete {
                    continuous |= bit << 4;
                }
            }
            MonitorBits::NonContinuous(bit) => {
                if status.enabled {
                    support |= bit;
                }
                if !status.complete {
                    not_complete |= bit;
                }
            }
        }
    }
    let s = support.to_le_bytes();
    let n = not_complete.to_le_bytes();
    [continuous, s[0], s[1], n[0], n[1]]
}

/// Messages that report monitored systems
pub trait DiagnosticReadiness {
    fn monitored_systems(&self) -> &[MonitoredSystem];

    /// True when every enabled non-continuous monitor reports not complete
    fn all_enabled_monitors_reset(&self) -> bool {
        self.monitored_systems()
            .iter()
            .filter(|m| !m.id.is_continuous() && m.status.enabled)
            .all(|m| !m.status.complete)
    }
}
