//! Sequential step execution

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use j1939_core::{CommunicationsModule, ModuleRegistry, ResultsListener};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::{StepError, StepResult};
use crate::step::{StepContext, StepController, StepIdentity};

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Aborted(String),
}

/// One executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub identity: StepIdentity,
    pub outcome: StepOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything a run executed, in execution order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The run was cancelled before every planned step executed
    pub cancelled: bool,
}

impl RunReport {
    /// The step that aborted the run, if any
    pub fn aborted(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Aborted(_)))
    }

    pub fn completed(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Completed)
            .count()
    }
}

/// Runs steps one at a time in ascending (part, step) order
pub struct TestScheduler {
    steps: Vec<Box<dyn StepController>>,
    listener: Arc<dyn ResultsListener>,
    registry: Arc<ModuleRegistry>,
    comms: CommunicationsModule,
    config: RunConfig,
}

impl TestScheduler {
    pub fn new(listener: Arc<dyn ResultsListener>, registry: Arc<ModuleRegistry>, comms: CommunicationsModule) -> Self {
        Self {
            steps: Vec::new(),
            listener,
            registry,
            comms,
            config: RunConfig::default(),
        }
    }

    /// Step selection and settle timing
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Box<dyn StepController>>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn add_step(&mut self, step: Box<dyn StepController>) {
        self.steps.push(step);
    }

    /// Identities of the steps a run would execute, in order
    pub fn planned(&self) -> Vec<StepIdentity> {
        let mut planned: Vec<StepIdentity> = self
            .steps
            .iter()
            .map(|s| s.identity())
            .filter(|id| self.config.selects(id.part, id.step))
            .collect();
        planned.sort_by_key(|id| (id.part, id.step));
        planned
    }

    /// Run on the current task. `cancel` is checked between steps.
    pub async fn run(mut self, cancel: Arc<AtomicBool>) -> RunReport {
        let config = self.config.clone();
        self.steps
            .retain(|s| config.selects(s.identity().part, s.identity().step));
        self.steps.sort_by_key(|s| {
            let id = s.identity();
            (id.part, id.step)
        });

        let started_at = Utc::now();
        let run_length = self.steps.len();
        let settle_unit = self.config.settle_unit();
        let mut records = Vec::with_capacity(run_length);
        let mut cancelled = false;

        info!(steps = run_length, "Run started");

        for (index, step) in self.steps.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                info!(remaining = run_length - index, "Run cancelled");
                cancelled = true;
                break;
            }

            let identity = step.identity();
            let name = step.display_name();
            let ctx = self.context(identity, settle_unit, index + 1, run_length);
            ctx.on_progress(&name);
            info!(part = identity.part, step = identity.step, "Step started");

            let step_started = Utc::now();
            let outcome = match step.run(&ctx).await {
                Ok(()) => StepOutcome::Completed,
                Err(e) => {
                    warn!(part = identity.part, step = identity.step, error = %e, "Step aborted");
                    ctx.on_result(format!("ABORTED: {}: {}", name, e));
                    StepOutcome::Aborted(e.to_string())
                }
            };
            let aborted = matches!(outcome, StepOutcome::Aborted(_));
            records.push(StepRecord {
                identity,
                outcome,
                started_at: step_started,
                finished_at: Utc::now(),
            });
            if aborted {
                break;
            }
        }

        let report = RunReport {
            steps: records,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };
        info!(
            completed = report.completed(),
            aborted = report.aborted().is_some(),
            cancelled,
            "Run finished"
        );
        report
    }

    /// Run on a spawned worker task
    pub fn spawn(self) -> RunHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(self.run(cancel.clone()));
        RunHandle { cancel, task }
    }

    fn context(&self, identity: StepIdentity, settle_unit: Duration, index: usize, run_length: usize) -> StepContext {
        StepContext::new(
            identity,
            self.listener.clone(),
            self.registry.clone(),
            self.comms.clone(),
        )
        .with_settle_unit(settle_unit)
        .with_settle_seconds(self.config.settle_seconds)
        .with_position(index, run_length)
    }
}

/// Cancels a run from anywhere, e.g. a signal handler
#[derive(Debug, Clone)]
pub struct RunCanceller(Arc<AtomicBool>);

impl RunCanceller {
    /// Stop the run before its next step starts. The running step finishes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Handle to a spawned run
pub struct RunHandle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Stop the run before its next step starts. The running step finishes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn canceller(&self) -> RunCanceller {
        RunCanceller(self.cancel.clone())
    }

    pub async fn join(self) -> StepResult<RunReport> {
        self.task
            .await
            .map_err(|e| StepError::Interrupted(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use j1939_core::{CollectingListener, GatewayError, Severity};
    use j1939_sim::SimulatedVehicle;
    use pretty_assertions::assert_eq;

    /// Reports one INFO naming itself, or aborts
    struct StubStep {
        identity: StepIdentity,
        abort: bool,
    }

    #[async_trait]
    impl StepController for StubStep {
        fn identity(&self) -> StepIdentity {
            self.identity
        }

        async fn run(&self, ctx: &StepContext) -> StepResult<()> {
            if self.abort {
                return Err(StepError::Gateway(GatewayError::Unavailable("adapter unplugged".to_string())));
            }
            ctx.add_info(format!("ran {}", self.identity));
            Ok(())
        }
    }

    fn step(part: u8, step: u8) -> Box<dyn StepController> {
        Box::new(StubStep {
            identity: StepIdentity::new(part, step, 1),
            abort: false,
        })
    }

    fn aborting(part: u8, step: u8) -> Box<dyn StepController> {
        Box::new(StubStep {
            identity: StepIdentity::new(part, step, 1),
            abort: true,
        })
    }

    fn scheduler(steps: Vec<Box<dyn StepController>>) -> (TestScheduler, Arc<CollectingListener>) {
        let listener = Arc::new(CollectingListener::new());
        let scheduler = TestScheduler::new(
            listener.clone(),
            Arc::new(ModuleRegistry::new()),
            CommunicationsModule::new(Arc::new(SimulatedVehicle::new())),
        )
        .with_steps(steps);
        (scheduler, listener)
    }

    #[tokio::test]
    async fn test_runs_in_part_step_order() {
        let (scheduler, listener) = scheduler(vec![step(12, 9), step(2, 9), step(3, 7)]);
        assert_eq!(
            scheduler.planned(),
            vec![
                StepIdentity::new(2, 9, 1),
                StepIdentity::new(3, 7, 1),
                StepIdentity::new(12, 9, 1)
            ]
        );

        let report = scheduler.spawn().join().await.unwrap();

        assert_eq!(report.completed(), 3);
        assert!(!report.cancelled);
        assert_eq!(
            listener.messages(Severity::Info),
            vec!["ran Part 2 Step 9", "ran Part 3 Step 7", "ran Part 12 Step 9"]
        );
        assert_eq!(
            listener.progress(),
            vec!["Part 2 Step 9", "Part 3 Step 7", "Part 12 Step 9"]
        );
    }

    #[tokio::test]
    async fn test_selection_filters_steps() {
        let (scheduler, listener) = scheduler(vec![step(12, 9), step(2, 9), step(3, 7)]);
        let scheduler = scheduler.with_config(RunConfig {
            steps: vec!["3.7".to_string()],
            ..RunConfig::default()
        });

        let report = scheduler.spawn().join().await.unwrap();
        assert_eq!(report.steps.len(), 1);
        assert_eq!(listener.messages(Severity::Info), vec!["ran Part 3 Step 7"]);
    }

    #[tokio::test]
    async fn test_abort_stops_the_run() {
        let (scheduler, listener) = scheduler(vec![step(2, 9), aborting(3, 7), step(12, 9)]);

        let report = scheduler.spawn().join().await.unwrap();

        assert_eq!(report.steps.len(), 2);
        let aborted = report.aborted().unwrap();
        assert_eq!(aborted.identity, StepIdentity::new(3, 7, 1));
        assert_eq!(
            aborted.outcome,
            StepOutcome::Aborted("Gateway error: Bus unavailable: adapter unplugged".to_string())
        );
        assert!(listener
            .results()
            .contains(&"ABORTED: Part 3 Step 7: Gateway error: Bus unavailable: adapter unplugged".to_string()));
        assert_eq!(listener.messages(Severity::Info), vec!["ran Part 2 Step 9"]);
    }

    #[tokio::test]
    async fn test_cancel_before_first_step() {
        let (scheduler, listener) = scheduler(vec![step(2, 9), step(3, 7)]);
        let cancel = Arc::new(AtomicBool::new(true));

        let report = scheduler.run(cancel).await;

        assert!(report.cancelled);
        assert!(report.steps.is_empty());
        assert!(listener.events().is_empty());
    }
}
