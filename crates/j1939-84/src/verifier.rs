//! Cross-module erasure verification
//!
//! After a clear, every OBD module must have erased its diagnostic
//! information completely or not at all, and the modules must agree with
//! each other. Each module is probed with fifteen directed requests; each
//! probe votes whether the module's answer is in its erased state.
//!
//! A probe that gets no usable answer (no response, an acknowledgment, an
//! unavailable counter or a malformed message) abstains: it neither fails a
//! verification nor counts towards a module's atomicity.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use j1939_core::{CommunicationsModule, ModuleRegistry, ResultsListener, Severity};
use j1939_packets::messages::{
    Dm12MilOnDtcs, Dm20MonitorPerformanceRatio, Dm21DiagnosticReadiness, Dm23PreviouslyMilOnDtcs,
    Dm25ExpandedFreezeFrame, Dm26TripDiagnosticReadiness, Dm28PermanentDtcs, Dm29DtcCounts,
    Dm30ScaledTestResults, Dm31DtcToLampAssociation, Dm33EmissionIncreasingAecdActiveTime,
    Dm5DiagnosticReadiness, Dm6PendingDtcs, EngineHours, IdleOperation,
};
use j1939_packets::{address_name, DiagnosticMessage, ErasedState, ResettableCounter};
use tracing::debug;

use crate::error::StepResult;
use crate::step::{report, StepContext};

/// One erasure probe, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErasureProbe {
    Dm6,
    Dm12,
    Dm23,
    Dm29,
    Dm5,
    Dm25,
    Dm31,
    Dm21,
    Dm26,
    TestResults,
    Dm20,
    Dm28,
    Dm33,
    EngineRunTime,
    EngineIdleTime,
}

impl ErasureProbe {
    pub const ALL: [ErasureProbe; 15] = [
        ErasureProbe::Dm6,
        ErasureProbe::Dm12,
        ErasureProbe::Dm23,
        ErasureProbe::Dm29,
        ErasureProbe::Dm5,
        ErasureProbe::Dm25,
        ErasureProbe::Dm31,
        ErasureProbe::Dm21,
        ErasureProbe::Dm26,
        ErasureProbe::TestResults,
        ErasureProbe::Dm20,
        ErasureProbe::Dm28,
        ErasureProbe::Dm33,
        ErasureProbe::EngineRunTime,
        ErasureProbe::EngineIdleTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ErasureProbe::Dm6 => "DM6 pending DTCs",
            ErasureProbe::Dm12 => "DM12 active DTCs",
            ErasureProbe::Dm23 => "DM23 previously active DTCs",
            ErasureProbe::Dm29 => "DM29 DTC counts",
            ErasureProbe::Dm5 => "DM5 diagnostic readiness",
            ErasureProbe::Dm25 => "DM25 freeze frame data",
            ErasureProbe::Dm31 => "DM31 DTC lamp status",
            ErasureProbe::Dm21 => "DM21 distance and time since clear",
            ErasureProbe::Dm26 => "DM26 monitor status",
            ErasureProbe::TestResults => "DM30 test results",
            ErasureProbe::Dm20 => "DM20 ignition cycle counter",
            ErasureProbe::Dm28 => "DM28 permanent DTCs",
            ErasureProbe::Dm33 => "DM33 EI-AECD active time",
            ErasureProbe::EngineRunTime => "engine run time",
            ErasureProbe::EngineIdleTime => "engine idle time",
        }
    }

    /// Counters and permanent DTCs survive a clear, so they are only checked
    /// when the data is expected to be retained
    pub fn checked_for_erased(&self) -> bool {
        !matches!(
            self,
            ErasureProbe::Dm20
                | ErasureProbe::Dm28
                | ErasureProbe::Dm33
                | ErasureProbe::EngineRunTime
                | ErasureProbe::EngineIdleTime
        )
    }
}

impl fmt::Display for ErasureProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate of one module's votes at one instant.
///
/// `representative_erased` is the first vote cast. It is only meaningful on
/// its own when `is_mixed` is false; which vote represents a mixed module is
/// implementation-defined.
///
/// Abstention is implementation-defined too: a probe answered with nothing,
/// an ACK/NACK, a malformed message or an unavailable counter casts no vote
/// and is left out of `votes`. A module with no votes reports
/// `representative_erased == false`, `is_mixed == false` and takes no part in
/// the fleet comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleErasureRecord {
    pub representative_erased: bool,
    pub is_mixed: bool,
    /// Probes that did not abstain
    pub votes: usize,
}

/// Erasure probes for the OBD modules of one run. Holds no state between
/// calls; every verification re-reads the bus.
pub struct ErasureVerifier {
    part: u8,
    step: u8,
    comms: CommunicationsModule,
    registry: Arc<ModuleRegistry>,
}

impl ErasureVerifier {
    pub fn new(part: u8, step: u8, comms: CommunicationsModule, registry: Arc<ModuleRegistry>) -> Self {
        Self {
            part,
            step,
            comms,
            registry,
        }
    }

    /// Verifier reporting under the identity of the step running in `ctx`
    pub fn for_step(ctx: &StepContext) -> Self {
        Self::new(ctx.part(), ctx.step(), ctx.comms().clone(), ctx.registry().clone())
    }

    /// Fail for every OBD module and erasable probe that is not erased
    pub async fn verify_data_erased(&self, listener: &dyn ResultsListener, section: &str) -> StepResult<()> {
        self.verify_all(listener, section, true).await
    }

    /// Fail for every OBD module and probe that shows erased data
    pub async fn verify_data_not_erased(&self, listener: &dyn ResultsListener, section: &str) -> StepResult<()> {
        self.verify_all(listener, section, false).await
    }

    async fn verify_all(&self, listener: &dyn ResultsListener, section: &str, expect_erased: bool) -> StepResult<()> {
        listener.on_result(&format!("{} - Checking for erased diagnostic information", section));
        for address in self.registry.obd_addresses() {
            for probe in ErasureProbe::ALL {
                if expect_erased && !probe.checked_for_erased() {
                    continue;
                }
                self.verify_probe(listener, section, address, probe, expect_erased)
                    .await?;
            }
        }
        Ok(())
    }

    /// Run one probe in verify mode. A vote that disagrees with `expect_erased`
    /// is reported; the vote is returned either way.
    pub async fn verify_probe(
        &self,
        listener: &dyn ResultsListener,
        section: &str,
        address: u8,
        probe: ErasureProbe,
        expect_erased: bool,
    ) -> StepResult<Option<bool>> {
        let vote = self.probe(address, probe).await?;
        if vote.is_some_and(|erased| erased != expect_erased) {
            let verb = if expect_erased { "erase" } else { "retain" };
            report(
                listener,
                self.part,
                self.step,
                Severity::Fail,
                &format!("{} - {} did not {} {}", section, address_name(address), verb, probe),
            );
        }
        Ok(vote)
    }

    /// Run one probe in aggregate mode
    pub async fn probe(&self, address: u8, probe: ErasureProbe) -> StepResult<Option<bool>> {
        let baselines = self.registry.baselines(address);
        let vote = match probe {
            ErasureProbe::Dm6 => self.erased::<Dm6PendingDtcs>(address).await?,
            ErasureProbe::Dm12 => self.erased::<Dm12MilOnDtcs>(address).await?,
            ErasureProbe::Dm23 => self.erased::<Dm23PreviouslyMilOnDtcs>(address).await?,
            ErasureProbe::Dm29 => self.erased::<Dm29DtcCounts>(address).await?,
            ErasureProbe::Dm5 => self.erased::<Dm5DiagnosticReadiness>(address).await?,
            ErasureProbe::Dm25 => self.erased::<Dm25ExpandedFreezeFrame>(address).await?,
            ErasureProbe::Dm31 => self.erased::<Dm31DtcToLampAssociation>(address).await?,
            ErasureProbe::Dm21 => self.erased::<Dm21DiagnosticReadiness>(address).await?,
            ErasureProbe::Dm26 => self.erased::<Dm26TripDiagnosticReadiness>(address).await?,
            ErasureProbe::TestResults => self.erased::<Dm30ScaledTestResults>(address).await?,
            ErasureProbe::Dm20 => {
                self.reset::<Dm20MonitorPerformanceRatio>(address, baselines.ignition_cycles)
                    .await?
            }
            ErasureProbe::Dm28 => self.erased::<Dm28PermanentDtcs>(address).await?,
            ErasureProbe::Dm33 => {
                self.erased::<Dm33EmissionIncreasingAecdActiveTime>(address)
                    .await?
            }
            ErasureProbe::EngineRunTime => self.reset::<EngineHours>(address, baselines.engine_hours_raw).await?,
            ErasureProbe::EngineIdleTime => self.reset::<IdleOperation>(address, baselines.idle_hours_raw).await?,
        };
        debug!(address, probe = probe.label(), ?vote, "Erasure probe");
        Ok(vote)
    }

    async fn erased<M: DiagnosticMessage + ErasedState>(&self, address: u8) -> StepResult<Option<bool>> {
        let response = self.comms.request_directed::<M>(address).await?;
        Ok(response.packet().map(|m| m.is_erased()))
    }

    async fn reset<M: DiagnosticMessage + ResettableCounter>(
        &self,
        address: u8,
        baseline: Option<u32>,
    ) -> StepResult<Option<bool>> {
        let response = self.comms.request_directed::<M>(address).await?;
        Ok(response.packet().and_then(|m| m.is_reset(baseline)))
    }

    /// All fifteen probes for one module in aggregate mode
    pub async fn check_module_atomicity(&self, address: u8) -> StepResult<ModuleErasureRecord> {
        let mut votes = Vec::with_capacity(ErasureProbe::ALL.len());
        for probe in ErasureProbe::ALL {
            if let Some(vote) = self.probe(address, probe).await? {
                votes.push(vote);
            }
        }
        let representative_erased = votes.first().copied().unwrap_or(false);
        Ok(ModuleErasureRecord {
            representative_erased,
            is_mixed: votes.iter().any(|v| *v != representative_erased),
            votes: votes.len(),
        })
    }

    /// Fail (`section1`) for every module that erased partially, and fail once
    /// (`section2`) if the modules' representative votes disagree
    pub async fn verify_data_not_partial_erased(
        &self,
        listener: &dyn ResultsListener,
        section1: &str,
        section2: &str,
    ) -> StepResult<()> {
        listener.on_result(&format!("{} - Checking for erased diagnostic information", section1));

        let mut fleet = BTreeSet::new();
        for address in self.registry.obd_addresses() {
            let record = self.check_module_atomicity(address).await?;
            if record.is_mixed {
                report(
                    listener,
                    self.part,
                    self.step,
                    Severity::Fail,
                    &format!("{} - {} partially erased diagnostic information", section1, address_name(address)),
                );
            }
            if record.votes > 0 {
                fleet.insert(record.representative_erased);
            }
        }

        if fleet.len() > 1 {
            report(
                listener,
                self.part,
                self.step,
                Severity::Fail,
                &format!(
                    "{} - One or more than one ECU erased diagnostic information and one or more other ECUs did not erase diagnostic information",
                    section2
                ),
            );
        }
        Ok(())
    }
}
