//! Step execution contract
//!
//! Every clause controller implements [`StepController`]. The scheduler hands
//! each step a [`StepContext`] carrying the collaborators of the run (listener,
//! module registry, typed request layer) and the step's own identity, which
//! the reporting helpers stamp onto every outcome.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use j1939_core::{CommunicationsModule, ModuleRegistry, ResultsListener, Severity};
use tracing::debug;

use crate::error::StepResult;

/// Position of a step in the procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIdentity {
    pub part: u8,
    pub step: u8,
    /// Progress units the step reports while running
    pub total_steps: usize,
}

impl StepIdentity {
    pub const fn new(part: u8, step: u8, total_steps: usize) -> Self {
        Self {
            part,
            step,
            total_steps,
        }
    }

    pub fn display_name(&self) -> String {
        format!("Part {} Step {}", self.part, self.step)
    }
}

impl fmt::Display for StepIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Part {} Step {}", self.part, self.step)
    }
}

/// One clause of the procedure.
///
/// `run` performs the clause's request/verify/report sequence once. Rule
/// violations are reported through the context and do not make `run` fail;
/// an `Err` means the step could not proceed and ends the run.
#[async_trait]
pub trait StepController: Send + Sync {
    fn identity(&self) -> StepIdentity;

    fn display_name(&self) -> String {
        self.identity().display_name()
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()>;
}

/// Record one outcome and echo it to the result log
pub(crate) fn report(listener: &dyn ResultsListener, part: u8, step: u8, severity: Severity, message: &str) {
    debug!(part, step, %severity, text = message, "Outcome");
    listener.add_outcome(part, step, severity, message);
    listener.on_result(&format!("{}: {}", severity, message));
}

/// Everything a running step can use
#[derive(Clone)]
pub struct StepContext {
    identity: StepIdentity,
    listener: Arc<dyn ResultsListener>,
    registry: Arc<ModuleRegistry>,
    comms: CommunicationsModule,
    settle_seconds: u32,
    settle_unit: Duration,
    step_index: usize,
    run_length: usize,
}

impl StepContext {
    pub fn new(
        identity: StepIdentity,
        listener: Arc<dyn ResultsListener>,
        registry: Arc<ModuleRegistry>,
        comms: CommunicationsModule,
    ) -> Self {
        Self {
            identity,
            listener,
            registry,
            comms,
            settle_seconds: 5,
            settle_unit: Duration::from_secs(1),
            step_index: 1,
            run_length: 1,
        }
    }

    /// Length of one settle-delay unit
    pub fn with_settle_unit(mut self, unit: Duration) -> Self {
        self.settle_unit = unit;
        self
    }

    /// Units to wait after a clear before checking erased data
    pub fn with_settle_seconds(mut self, seconds: u32) -> Self {
        self.settle_seconds = seconds;
        self
    }

    /// Position of this step within the run, 1-based
    pub fn with_position(mut self, step_index: usize, run_length: usize) -> Self {
        self.step_index = step_index;
        self.run_length = run_length;
        self
    }

    pub fn identity(&self) -> StepIdentity {
        self.identity
    }

    pub fn part(&self) -> u8 {
        self.identity.part
    }

    pub fn step(&self) -> u8 {
        self.identity.step
    }

    pub fn listener(&self) -> &Arc<dyn ResultsListener> {
        &self.listener
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn comms(&self) -> &CommunicationsModule {
        &self.comms
    }

    pub fn settle_seconds(&self) -> u32 {
        self.settle_seconds
    }

    pub fn obd_addresses(&self) -> Vec<u8> {
        self.registry.obd_addresses()
    }

    pub fn add_failure(&self, message: impl AsRef<str>) {
        self.add_outcome(Severity::Fail, message.as_ref());
    }

    pub fn add_warning(&self, message: impl AsRef<str>) {
        self.add_outcome(Severity::Warn, message.as_ref());
    }

    pub fn add_info(&self, message: impl AsRef<str>) {
        self.add_outcome(Severity::Info, message.as_ref());
    }

    fn add_outcome(&self, severity: Severity, message: &str) {
        report(
            self.listener.as_ref(),
            self.identity.part,
            self.identity.step,
            severity,
            message,
        );
    }

    pub fn on_result(&self, line: impl AsRef<str>) {
        self.listener.on_result(line.as_ref());
    }

    pub fn on_progress(&self, note: impl AsRef<str>) {
        self.listener
            .on_progress(self.step_index, self.run_length, note.as_ref());
    }

    /// Wait `seconds` settle units before checking erased data, posting a
    /// countdown note per unit.
    pub async fn settle(&self, section: &str, seconds: u32) {
        for remaining in (1..=seconds).rev() {
            self.on_progress(format!(
                "Step {} Waiting {} seconds before checking for erased data.",
                section, remaining
            ));
            tokio::time::sleep(self.settle_unit).await;
        }
    }
}
