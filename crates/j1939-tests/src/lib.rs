//! Integration tests for the J1939-84 step runner
//!
//! The tests under `tests/` drive whole steps and runs against a
//! [`SimulatedVehicle`](j1939_sim::SimulatedVehicle). This library only holds
//! the module fixtures they share: simulated OBD modules answering all fifteen
//! erasure probes, each probe either in its erased or its populated state.
//!
//! ```bash
//! cargo test -p j1939-tests
//! ```

use j1939_84::ErasureProbe;
use j1939_packets::messages::{
    Dm12MilOnDtcs, Dm20MonitorPerformanceRatio, Dm21DiagnosticReadiness, Dm23PreviouslyMilOnDtcs,
    Dm22AckCode, Dm22Control, Dm22IndividualClear, Dm25ExpandedFreezeFrame, Dm26TripDiagnosticReadiness, Dm28PermanentDtcs, Dm29DtcCounts,
    Dm30ScaledTestResults, Dm31DtcToLampAssociation, Dm33EmissionIncreasingAecdActiveTime,
    Dm5DiagnosticReadiness, Dm6PendingDtcs, DtcLampStatus, EngineHours, EngineHoursTimer,
    IdleOperation, ScaledTestResult,
};
use j1939_packets::{
    pgn, CompositeSystem, DiagnosticTroubleCode, FreezeFrame, LampStatus, MonitorStatus,
};
use j1939_sim::{Reply, Scope, SimModule};

/// Compliance byte for an OBD-II/HD-OBD module
const OBD_COMPLIANCE: u8 = 0x14;

fn dtc() -> DiagnosticTroubleCode {
    DiagnosticTroubleCode::from_bytes([0x66, 0x00, 0x04, 0x01])
}

fn catalyst(complete: bool) -> [(CompositeSystem, MonitorStatus); 2] {
    [
        (
            CompositeSystem::ComprehensiveComponent,
            MonitorStatus {
                enabled: true,
                complete: true,
            },
        ),
        (
            CompositeSystem::Catalyst,
            MonitorStatus {
                enabled: true,
                complete,
            },
        ),
    ]
}

/// PGN and reply for `probe` in the erased (`true`) or populated state
pub fn probe_reply(address: u8, probe: ErasureProbe, erased: bool) -> (u32, Reply) {
    let dtcs: &[DiagnosticTroubleCode] = if erased { &[] } else { &[dtc()] };
    let mil = if erased { LampStatus::Off } else { LampStatus::On };
    let count = u8::from(!erased);
    let hours = if erased { 0 } else { 2_000 };

    match probe {
        ErasureProbe::Dm6 => (pgn::DM6, Reply::message(&Dm6PendingDtcs::create(address, mil, dtcs))),
        ErasureProbe::Dm12 => (pgn::DM12, Reply::message(&Dm12MilOnDtcs::create(address, mil, dtcs))),
        ErasureProbe::Dm23 => (
            pgn::DM23,
            Reply::message(&Dm23PreviouslyMilOnDtcs::create(address, mil, dtcs)),
        ),
        ErasureProbe::Dm29 => (
            pgn::DM29,
            Reply::message(&Dm29DtcCounts::create(address, count, count, count, count, count)),
        ),
        ErasureProbe::Dm5 => (
            pgn::DM5,
            Reply::message(&Dm5DiagnosticReadiness::create(
                address,
                count,
                count,
                OBD_COMPLIANCE,
                &catalyst(!erased),
            )),
        ),
        ErasureProbe::Dm25 => {
            let frames = if erased {
                Vec::new()
            } else {
                FreezeFrame::new(dtc(), vec![0x10, 0x27, 0x7D]).into_iter().collect()
            };
            (pgn::DM25, Reply::message(&Dm25ExpandedFreezeFrame::create(address, frames)))
        }
        ErasureProbe::Dm31 => {
            let records: Vec<DtcLampStatus> = dtcs.iter().map(|&dtc| DtcLampStatus { dtc, mil }).collect();
            (pgn::DM31, Reply::message(&Dm31DtcToLampAssociation::create(address, &records)))
        }
        ErasureProbe::Dm21 => {
            let minutes = if erased { 0 } else { 45 };
            (
                pgn::DM21,
                Reply::message(&Dm21DiagnosticReadiness::create(address, 0, 0, 0, minutes)),
            )
        }
        ErasureProbe::Dm26 => (
            pgn::DM26,
            Reply::message(&Dm26TripDiagnosticReadiness::create(address, 0, 0, &catalyst(!erased))),
        ),
        ErasureProbe::TestResults => {
            let mut result = ScaledTestResult::initialized(247, 5319, 31, 1);
            if !erased {
                result.test_value = 100;
                result.test_maximum = 500;
                result.test_minimum = 0;
            }
            (pgn::DM30, Reply::message(&Dm30ScaledTestResults::create(address, &[result])))
        }
        ErasureProbe::Dm20 => (
            pgn::DM20,
            Reply::message(&Dm20MonitorPerformanceRatio::create(address, u16::from(count) * 12, 0, &[])),
        ),
        ErasureProbe::Dm28 => (pgn::DM28, Reply::message(&Dm28PermanentDtcs::create(address, mil, dtcs))),
        ErasureProbe::Dm33 => {
            let timer = Some(u32::from(count) * 30);
            let timers = [EngineHoursTimer {
                aecd_number: 1,
                timer1: timer,
                timer2: timer,
            }];
            (
                pgn::DM33,
                Reply::message(&Dm33EmissionIncreasingAecdActiveTime::create(address, &timers)),
            )
        }
        ErasureProbe::EngineRunTime => (
            pgn::ENGINE_HOURS,
            Reply::message(&EngineHours::create(address, hours, hours * 4)),
        ),
        ErasureProbe::EngineIdleTime => (
            pgn::IDLE_OPERATION,
            Reply::message(&IdleOperation::create(address, hours / 10, hours / 5)),
        ),
    }
}

/// OBD module whose probes are erased where `erased(probe)` holds
pub fn probe_module(address: u8, erased: impl Fn(ErasureProbe) -> bool) -> SimModule {
    ErasureProbe::ALL
        .into_iter()
        .fold(SimModule::new(address).obd(), |module, probe| {
            let (pgn, reply) = probe_reply(address, probe, erased(probe));
            module.respond(pgn, reply)
        })
}

/// OBD module with every probe in its erased state
pub fn erased_module(address: u8) -> SimModule {
    probe_module(address, |_| true)
}

/// OBD module with every probe populated
pub fn dirty_module(address: u8) -> SimModule {
    probe_module(address, |_| false)
}

/// Populated OBD module that NACKs a directed DM11, acknowledges a global one
/// and is fully erased afterwards. Individual DM22 clears are always refused
/// with acknowledgement code 0.
pub fn clearable_module(address: u8) -> SimModule {
    ErasureProbe::ALL.into_iter().fold(
        dirty_module(address)
            .respond_to(pgn::DM11, Scope::Directed, Reply::Nack)
            .respond_to(pgn::DM11, Scope::Global, Reply::Ack)
            .with_message(&Dm22IndividualClear::create(
                address,
                Dm22Control::ClrPaNack,
                Dm22AckCode::GeneralNack,
                dtc().spn,
                dtc().fmi,
            )),
        |module, probe| {
            let (pgn, reply) = probe_reply(address, probe, true);
            module.respond_after_clear(pgn, reply)
        },
    )
}
