//! Decoded diagnostic messages, one module per message family

mod aecd;
mod counts;
mod dtc_lists;
mod engine;
mod freeze_frames;
mod individual_clear;
mod lamps;
mod performance;
mod readiness;
mod test_results;

pub use aecd::{Dm33EmissionIncreasingAecdActiveTime, EngineHoursTimer};
pub use counts::Dm29DtcCounts;
pub use dtc_lists::{
    Dm12MilOnDtcs, Dm1ActiveDtcs, Dm23PreviouslyMilOnDtcs, Dm28PermanentDtcs,
    Dm2PreviouslyActiveDtcs, Dm6PendingDtcs,
};
pub use engine::{EngineHours, IdleOperation, HOURS_PER_BIT};
pub use freeze_frames::Dm25ExpandedFreezeFrame;
pub use individual_clear::{Dm22AckCode, Dm22Control, Dm22IndividualClear};
pub use lamps::{Dm31DtcToLampAssociation, DtcLampStatus};
pub use performance::{Dm20MonitorPerformanceRatio, PerformanceRatio};
pub use readiness::{Dm21DiagnosticReadiness, Dm26TripDiagnosticReadiness, Dm5DiagnosticReadiness};
pub use test_results::{
    Dm30ScaledTestResults, ScaledTestResult, TEST_LIMIT_INITIALIZED, TEST_VALUE_INITIALIZED,
};
