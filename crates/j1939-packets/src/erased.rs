//! Per-message "erased" judgments.
//!
//! A clear (DM11) resets fault memory to a message-specific state. Messages
//! whose erased state can be read from the message alone implement
//! [`ErasedState`]. Run-time counters can only be judged against a value
//! recorded earlier, so they implement [`ResettableCounter`] instead.

use crate::messages::{
    Dm12MilOnDtcs, Dm20MonitorPerformanceRatio, Dm21DiagnosticReadiness,
    Dm23PreviouslyMilOnDtcs, Dm25ExpandedFreezeFrame, Dm26TripDiagnosticReadiness, Dm28PermanentDtcs,
    Dm29DtcCounts, Dm30ScaledTestResults, Dm31DtcToLampAssociation,
    Dm33EmissionIncreasingAecdActiveTime, Dm5DiagnosticReadiness, Dm6PendingDtcs, EngineHours,
    IdleOperation,
};
use crate::monitor::DiagnosticReadiness;

/// A message that reports whether the module's fault memory is in its cleared state
pub trait ErasedState {
    fn is_erased(&self) -> bool;
}

macro_rules! erased_when_no_dtcs {
    ($($name:ty),+) => {
        $(impl ErasedState for $name {
            fn is_erased(&self) -> bool {
                !self.has_dtcs()
            }
        })+
    };
}

erased_when_no_dtcs!(Dm6PendingDtcs, Dm12MilOnDtcs, Dm23PreviouslyMilOnDtcs, Dm28PermanentDtcs);

impl ErasedState for Dm29DtcCounts {
    /// Unavailable counts do not count against the clear
    fn is_erased(&self) -> bool {
        [
            self.emission_related_pending(),
            self.all_pending(),
            self.emission_related_mil_on(),
            self.emission_related_previously_mil_on(),
        ]
        .iter()
        .all(|count| count.unwrap_or(0) == 0)
    }
}

impl ErasedState for Dm5DiagnosticReadiness {
    fn is_erased(&self) -> bool {
        self.active_count() == 0
            && self.previously_active_count() == 0
            && self.all_enabled_monitors_reset()
    }
}

impl ErasedState for Dm25ExpandedFreezeFrame {
    fn is_erased(&self) -> bool {
        self.freeze_frames().is_empty()
    }
}

impl ErasedState for Dm31DtcToLampAssociation {
    fn is_erased(&self) -> bool {
        self.dtc_lamp_statuses().is_empty()
    }
}

impl ErasedState for Dm21DiagnosticReadiness {
    fn is_erased(&self) -> bool {
        [
            self.km_while_mil_on(),
            self.km_since_dtcs_cleared(),
            self.minutes_while_mil_on(),
            self.minutes_since_dtcs_cleared(),
        ]
        .iter()
        .all(|value| value.unwrap_or(0) == 0)
    }
}

impl ErasedState for Dm26TripDiagnosticReadiness {
    fn is_erased(&self) -> bool {
        self.all_enabled_monitors_reset()
    }
}

impl ErasedState for Dm30ScaledTestResults {
    fn is_erased(&self) -> bool {
        self.test_results().iter().all(|r| r.is_initialized())
    }
}

impl ErasedState for Dm33EmissionIncreasingAecdActiveTime {
    fn is_erased(&self) -> bool {
        self.timers()
            .iter()
            .all(|t| t.timer1.unwrap_or(0) == 0 && t.timer2.unwrap_or(0) == 0)
    }
}

/// A monotonically increasing counter that a clear may reset
pub trait ResettableCounter {
    /// Raw counter value, `None` when the module reports it unavailable
    fn counter(&self) -> Option<u32>;

    /// Whether the counter was reset relative to `baseline`.
    ///
    /// With a baseline the counter must have dropped below it; without one it
    /// must read zero. `None` when the counter is unavailable.
    fn is_reset(&self, baseline: Option<u32>) -> Option<bool> {
        let value = self.counter()?;
        Some(match baseline {
            Some(baseline) => value < baseline,
            None => value == 0,
        })
    }
}

impl ResettableCounter for Dm20MonitorPerformanceRatio {
    fn counter(&self) -> Option<u32> {
        self.ignition_cycles().map(u32::from)
    }
}

impl ResettableCounter for EngineHours {
    fn counter(&self) -> Option<u32> {
        self.total_hours_raw()
    }
}

impl ResettableCounter for IdleOperation {
    fn counter(&self) -> Option<u32> {
        self.total_idle_hours_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtc::{DiagnosticTroubleCode, LampStatus};
    use crate::messages::{EngineHoursTimer, ScaledTestResult};
    use crate::monitor::{CompositeSystem, MonitorStatus};

    fn dtc() -> DiagnosticTroubleCode {
        DiagnosticTroubleCode::new(102, 4, 1, 0).unwrap()
    }

    #[test]
    fn test_dtc_lists() {
        assert!(Dm6PendingDtcs::create(0, LampStatus::Off, &[]).is_erased());
        assert!(!Dm12MilOnDtcs::create(0, LampStatus::On, &[dtc()]).is_erased());
    }

    #[test]
    fn test_dm29_ignores_permanent_count() {
        assert!(Dm29DtcCounts::create(0, 0, 0, 0, 0, 3).is_erased());
        assert!(!Dm29DtcCounts::create(0, 0, 1, 0, 0, 0).is_erased());
        assert!(Dm29DtcCounts::create(0, 0, 0xFF, 0, 0, 0).is_erased());
    }

    #[test]
    fn test_dm5_requires_monitors_reset() {
        let reset = MonitorStatus {
            enabled: true,
            complete: false,
        };
        let done = MonitorStatus {
            enabled: true,
            complete: true,
        };
        assert!(Dm5DiagnosticReadiness::create(0, 0, 0, 0x14, &[(CompositeSystem::Catalyst, reset)]).is_erased());
        assert!(!Dm5DiagnosticReadiness::create(0, 0, 0, 0x14, &[(CompositeSystem::Catalyst, done)]).is_erased());
        // continuous monitors stay complete after a clear
        assert!(Dm5DiagnosticReadiness::create(0, 0, 0, 0x14, &[(CompositeSystem::Misfire, done)]).is_erased());
        assert!(!Dm5DiagnosticReadiness::create(0, 1, 0, 0x14, &[]).is_erased());
    }

    #[test]
    fn test_dm21() {
        assert!(Dm21DiagnosticReadiness::create(0, 0, 0, 0, 0).is_erased());
        assert!(Dm21DiagnosticReadiness::create(0, 0, 0xFFFF, 0, 0).is_erased());
        assert!(!Dm21DiagnosticReadiness::create(0, 0, 0, 0, 20).is_erased());
    }

    #[test]
    fn test_dm30_and_dm33() {
        let reset = ScaledTestResult::initialized(247, 3226, 18, 8);
        let ran = ScaledTestResult {
            test_value: 12,
            ..reset
        };
        assert!(Dm30ScaledTestResults::create(0, &[reset]).is_erased());
        assert!(!Dm30ScaledTestResults::create(0, &[reset, ran]).is_erased());

        let timer = EngineHoursTimer {
            aecd_number: 1,
            timer1: Some(0),
            timer2: None,
        };
        assert!(Dm33EmissionIncreasingAecdActiveTime::create(0, &[timer]).is_erased());
        let timer = EngineHoursTimer {
            timer1: Some(5),
            ..timer
        };
        assert!(!Dm33EmissionIncreasingAecdActiveTime::create(0, &[timer]).is_erased());
    }

    #[test]
    fn test_counter_reset() {
        let hours = EngineHours::create(0, 100, 0);
        assert_eq!(hours.is_reset(Some(200)), Some(true));
        assert_eq!(hours.is_reset(Some(100)), Some(false));
        assert_eq!(hours.is_reset(None), Some(false));
        assert_eq!(EngineHours::create(0, 0, 0).is_reset(None), Some(true));
        assert_eq!(IdleOperation::create(0, 0, u32::MAX).is_reset(None), None);
        assert_eq!(Dm20MonitorPerformanceRatio::create(0, 0, 0, &[]).is_reset(Some(12)), Some(true));
    }
}
