//! Erasure verification across simulated OBD modules
//!
//! Registries here come from the simulated vehicle and carry no counter
//! baselines, so a counter probe votes "erased" when it reads zero.

use std::sync::Arc;

use j1939_84::{ErasureProbe, ErasureVerifier, ModuleErasureRecord};
use j1939_core::{CollectingListener, CommunicationsModule, Severity};
use j1939_sim::{SimModule, SimulatedVehicle};
use j1939_tests::{dirty_module, erased_module, probe_module};
use pretty_assertions::assert_eq;

const PARTIAL: &str =
    "6.12.9.2.c - One or more than one ECU erased diagnostic information and one or more other ECUs did not erase diagnostic information";

fn verifier(modules: Vec<SimModule>) -> ErasureVerifier {
    let vehicle = modules
        .into_iter()
        .fold(SimulatedVehicle::new(), |vehicle, module| vehicle.with_module(module));
    let registry = vehicle.registry();
    ErasureVerifier::new(
        12,
        9,
        CommunicationsModule::new(Arc::new(vehicle)),
        Arc::new(registry),
    )
}

async fn partial_erase_failures(verifier: &ErasureVerifier) -> Vec<String> {
    let listener = CollectingListener::new();
    verifier
        .verify_data_not_partial_erased(&listener, "6.12.9.2.b", "6.12.9.2.c")
        .await
        .unwrap();
    listener.messages(Severity::Fail)
}

#[tokio::test]
async fn test_fixture_modules_vote_uniformly() {
    let verifier = verifier(vec![erased_module(0), dirty_module(0x3D)]);

    assert_eq!(
        verifier.check_module_atomicity(0).await.unwrap(),
        ModuleErasureRecord {
            representative_erased: true,
            is_mixed: false,
            votes: 15
        }
    );
    assert_eq!(
        verifier.check_module_atomicity(0x3D).await.unwrap(),
        ModuleErasureRecord {
            representative_erased: false,
            is_mixed: false,
            votes: 15
        }
    );
}

#[tokio::test]
async fn test_all_erased_against_all_retained() {
    let verifier = verifier(vec![erased_module(0), dirty_module(0x3D)]);

    assert_eq!(partial_erase_failures(&verifier).await, vec![PARTIAL]);
}

#[tokio::test]
async fn test_single_module_with_one_retained_probe() {
    let verifier = verifier(vec![probe_module(0, |p| p != ErasureProbe::Dm33)]);

    let record = verifier.check_module_atomicity(0).await.unwrap();
    assert!(record.is_mixed);
    assert_eq!(record.votes, 15);
    assert_eq!(
        partial_erase_failures(&verifier).await,
        vec!["6.12.9.2.b - Engine #1 (0) partially erased diagnostic information"]
    );
}

#[tokio::test]
async fn test_mixed_module_contributes_its_first_vote() {
    // DM6 is probed first; the mixed module votes with it
    let first_erased = verifier(vec![
        probe_module(0, |p| p == ErasureProbe::Dm6),
        erased_module(0x3D),
    ]);
    assert_eq!(
        partial_erase_failures(&first_erased).await,
        vec!["6.12.9.2.b - Engine #1 (0) partially erased diagnostic information"]
    );

    let first_retained = verifier(vec![
        probe_module(0, |p| p != ErasureProbe::Dm6),
        erased_module(0x3D),
    ]);
    assert_eq!(
        partial_erase_failures(&first_retained).await,
        vec![
            "6.12.9.2.b - Engine #1 (0) partially erased diagnostic information",
            PARTIAL
        ]
    );
}

#[tokio::test]
async fn test_partial_erase_check_is_idempotent() {
    let verifier = verifier(vec![
        probe_module(0, |p| p.checked_for_erased()),
        dirty_module(1),
        erased_module(0x3D),
    ]);

    let first = partial_erase_failures(&verifier).await;
    let second = partial_erase_failures(&verifier).await;

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_verify_erased_checks_first_ten_probes() {
    let verifier = verifier(vec![dirty_module(0)]);
    let listener = CollectingListener::new();

    verifier.verify_data_erased(&listener, "6.3.1.2.a").await.unwrap();

    let failures = listener.messages(Severity::Fail);
    assert_eq!(failures.len(), 10);
    assert_eq!(failures[0], "6.3.1.2.a - Engine #1 (0) did not erase DM6 pending DTCs");
    assert_eq!(failures[9], "6.3.1.2.a - Engine #1 (0) did not erase DM30 test results");
}

#[tokio::test]
async fn test_verify_not_erased_checks_every_probe() {
    let verifier = verifier(vec![erased_module(0), dirty_module(0x3D)]);
    let listener = CollectingListener::new();

    verifier.verify_data_not_erased(&listener, "6.3.1.2.b").await.unwrap();

    let failures = listener.messages(Severity::Fail);
    assert_eq!(failures.len(), 15);
    assert!(failures.iter().all(|f| f.starts_with("6.3.1.2.b - Engine #1 (0) did not retain ")));
    assert_eq!(failures[14], "6.3.1.2.b - Engine #1 (0) did not retain engine idle time");
}
