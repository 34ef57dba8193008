//! Whole runs of the scheduler against a simulated vehicle

use std::io::Write;
use std::sync::Arc;

use j1939_84::{all_steps, RunConfig, StepIdentity, StepOutcome, TestScheduler};
use j1939_core::{CollectingListener, CommunicationsModule, ModuleRegistry, Severity};
use j1939_packets::messages::Dm2PreviouslyActiveDtcs;
use j1939_packets::{DiagnosticMessage, DiagnosticTroubleCode, LampStatus};
use j1939_sim::{SimulatedVehicle, VehicleConfig};
use j1939_tests::clearable_module;
use pretty_assertions::assert_eq;

struct Harness {
    vehicle: Arc<SimulatedVehicle>,
    comms: CommunicationsModule,
    listener: Arc<CollectingListener>,
}

impl Harness {
    fn new(vehicle: SimulatedVehicle) -> Self {
        let vehicle = Arc::new(vehicle);
        Self {
            comms: CommunicationsModule::new(vehicle.clone()),
            vehicle,
            listener: Arc::new(CollectingListener::new()),
        }
    }

    async fn scheduler(&self, config: RunConfig) -> TestScheduler {
        let registry = ModuleRegistry::discover(&self.comms).await.unwrap();
        TestScheduler::new(self.listener.clone(), Arc::new(registry), self.comms.clone())
            .with_config(config)
            .with_steps(all_steps())
    }

    fn messages(&self, part: u8, severity: Severity) -> Vec<String> {
        self.listener
            .outcomes()
            .into_iter()
            .filter(|o| o.part == part && o.severity == severity)
            .map(|o| o.message)
            .collect()
    }
}

fn two_module_vehicle() -> SimulatedVehicle {
    SimulatedVehicle::new()
        .with_module(clearable_module(0))
        .with_module(clearable_module(0x3D))
}

#[tokio::test(start_paused = true)]
async fn test_full_run() {
    let harness = Harness::new(two_module_vehicle());
    let scheduler = harness.scheduler(RunConfig::default()).await;

    let report = scheduler.spawn().join().await.unwrap();

    assert_eq!(report.completed(), 5);
    assert!(report.aborted().is_none());
    assert_eq!(
        report.steps.iter().map(|s| s.identity).collect::<Vec<_>>(),
        vec![
            StepIdentity::new(2, 9, 0),
            StepIdentity::new(3, 7, 0),
            StepIdentity::new(7, 4, 0),
            StepIdentity::new(8, 12, 0),
            StepIdentity::new(12, 9, 0),
        ]
    );

    // the modules still hold their DTCs when part 7 runs
    assert_eq!(
        harness.messages(7, Severity::Fail),
        vec![
            "6.7.4.2.a - OBD ECU Engine #1 (0) reported an active DTC",
            "6.7.4.2.b - OBD ECU Engine #1 (0) did not report MIL off",
            "6.7.4.2.a - OBD ECU Exhaust Emission Controller (61) reported an active DTC",
            "6.7.4.2.b - OBD ECU Exhaust Emission Controller (61) did not report MIL off",
        ]
    );
    assert_eq!(
        harness
            .listener
            .outcomes()
            .iter()
            .filter(|o| o.severity == Severity::Fail)
            .count(),
        4
    );
    // DM22 clears are refused and nothing is erased
    assert!(harness.messages(8, Severity::Warn).is_empty());
    assert!(harness.messages(8, Severity::Info).is_empty());
    assert_eq!(
        harness.messages(12, Severity::Warn),
        vec![
            "6.12.9.4.b - Engine #1 (0) responded with a ACK",
            "6.12.9.4.b - Exhaust Emission Controller (61) responded with a ACK",
        ]
    );
    assert!(harness.vehicle.is_cleared(0));
    assert!(harness.vehicle.is_cleared(0x3D));
}

#[tokio::test(start_paused = true)]
async fn test_selected_clear_step_with_discovered_baselines() {
    let harness = Harness::new(two_module_vehicle());
    let scheduler = harness
        .scheduler(RunConfig {
            steps: vec!["12.9".to_string()],
            ..RunConfig::default()
        })
        .await;

    let report = scheduler.spawn().join().await.unwrap();

    assert_eq!(report.steps.len(), 1);
    assert!(harness.messages(12, Severity::Fail).is_empty());
    assert_eq!(harness.listener.progress().first().map(String::as_str), Some("Part 12 Step 9"));
}

#[tokio::test]
async fn test_disconnect_aborts_run() {
    let harness = Harness::new(two_module_vehicle());
    let scheduler = harness.scheduler(RunConfig::default()).await;
    harness.vehicle.set_connected(false);

    let report = scheduler.spawn().join().await.unwrap();

    assert_eq!(report.steps.len(), 1);
    let aborted = report.aborted().unwrap();
    assert_eq!(aborted.identity, StepIdentity::new(2, 9, 0));
    assert!(matches!(&aborted.outcome, StepOutcome::Aborted(reason) if reason.contains("disconnected")));
    assert!(harness
        .listener
        .results()
        .contains(&"ABORTED: Part 2 Step 9: Gateway error: Bus unavailable: simulated vehicle disconnected".to_string()));
}

#[tokio::test]
async fn test_cancel_before_start() {
    let harness = Harness::new(two_module_vehicle());
    let scheduler = harness.scheduler(RunConfig::default()).await;

    let handle = scheduler.spawn();
    handle.cancel();
    let report = handle.join().await.unwrap();

    assert!(report.cancelled);
    assert!(report.steps.is_empty());
}

#[tokio::test]
async fn test_vehicle_from_config_file() {
    let dtc = DiagnosticTroubleCode::new(609, 19, 1, 0).unwrap();
    let dm2 = Dm2PreviouslyActiveDtcs::create(0, LampStatus::On, &[dtc]);
    let data: String = dm2.packet().bytes().iter().map(|b| format!("{:02X}", b)).collect();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[modules]]
address = "0x00"
obd = true
responses = [
    {{ pgn = "0xFECB", data = "{data}" }},
    {{ pgn = "0xFECE", data = "000014FF00000000" }},
]

[[modules]]
address = "0x17"
"#
    )
    .unwrap();

    let vehicle = SimulatedVehicle::from_config(&VehicleConfig::load(file.path()).unwrap());
    let harness = Harness::new(vehicle);
    let scheduler = harness
        .scheduler(RunConfig {
            steps: vec!["3.7".to_string()],
            ..RunConfig::default()
        })
        .await;

    scheduler.spawn().join().await.unwrap();

    assert_eq!(
        harness.messages(3, Severity::Fail),
        vec![
            "6.3.7.2.a - OBD ECU Engine #1 (0) reported a previously active DTC",
            "6.3.7.2.b - OBD ECU Engine #1 (0) did not report MIL off",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sample_configuration() {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs");
    let vehicle = VehicleConfig::load(format!("{}/vehicle.toml", root)).unwrap();
    let config = RunConfig::load(format!("{}/run.toml", root)).unwrap();
    let harness = Harness::new(SimulatedVehicle::from_config(&vehicle));

    let report = harness.scheduler(config).await.spawn().join().await.unwrap();

    assert_eq!(report.completed(), 5);
    // only the DTCs still present before the clear are reported
    assert_eq!(
        harness
            .listener
            .outcomes()
            .iter()
            .filter(|o| o.severity == Severity::Fail)
            .map(|o| (o.part, o.step))
            .collect::<Vec<_>>(),
        vec![(7, 4); 4]
    );
    assert_eq!(harness.messages(12, Severity::Warn).len(), 2);
    assert!(harness.vehicle.is_cleared(0) && harness.vehicle.is_cleared(0x3D));
}
