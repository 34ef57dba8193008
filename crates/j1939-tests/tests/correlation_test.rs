//! Response correlation and codec properties

use std::collections::BTreeSet;
use std::sync::Arc;

use j1939_84::{StepContext, StepIdentity};
use j1939_core::{CollectingListener, CommunicationsModule, ModuleRegistry, Severity};
use j1939_packets::messages::Dm21DiagnosticReadiness;
use j1939_packets::{address_name, AckResponse, Acknowledgment, DiagnosticTroubleCode, FreezeFrame};
use j1939_sim::SimulatedVehicle;
use pretty_assertions::assert_eq;

const ADDRESSES: [u8; 5] = [0x00, 0x01, 0x17, 0x21, 0x3D];

fn context() -> (StepContext, Arc<CollectingListener>) {
    let listener = Arc::new(CollectingListener::new());
    let ctx = StepContext::new(
        StepIdentity::new(2, 9, 0),
        listener.clone(),
        Arc::new(ModuleRegistry::new()),
        CommunicationsModule::new(Arc::new(SimulatedVehicle::new())),
    );
    (ctx, listener)
}

fn subset(mask: u32) -> Vec<u8> {
    ADDRESSES
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, a)| *a)
        .collect()
}

#[test]
fn test_missing_nacks_are_the_set_difference() {
    // obd addresses carry a duplicate to check it is reported once
    let obd: Vec<u8> = ADDRESSES.iter().chain([0x17, 0x00].iter()).copied().collect();

    for global_mask in 0..32 {
        for nack_mask in 0..32 {
            let (ctx, listener) = context();
            let global: Vec<Dm21DiagnosticReadiness> = subset(global_mask)
                .into_iter()
                .map(|a| Dm21DiagnosticReadiness::create(a, 0, 0, 0, 0))
                .collect();
            let mut acks: Vec<Acknowledgment> = subset(nack_mask)
                .into_iter()
                .map(|a| Acknowledgment::create(a, AckResponse::Nack, 0xC100))
                .collect();
            // positive acknowledgments never excuse a module
            acks.push(Acknowledgment::create(0x21, AckResponse::Ack, 0xC100));

            ctx.check_for_nacks(&global, &acks, &obd, "6.2.9.4.b");

            let responded: BTreeSet<u8> = subset(global_mask).into_iter().chain(subset(nack_mask)).collect();
            let expected: Vec<String> = ADDRESSES
                .iter()
                .filter(|a| !responded.contains(a))
                .map(|a| {
                    format!(
                        "6.2.9.4.b - OBD module {} did not provide a response to Global query and did not provide a NACK for the DS query",
                        address_name(*a)
                    )
                })
                .collect();
            assert_eq!(listener.messages(Severity::Fail), expected);
        }
    }
}

#[test]
fn test_many_divergences_fail_once() {
    let (ctx, listener) = context();
    let global: Vec<_> = ADDRESSES
        .iter()
        .map(|&a| Dm21DiagnosticReadiness::create(a, 0, 0, 0, 10))
        .collect();
    let directed: Vec<_> = ADDRESSES
        .iter()
        .map(|&a| Dm21DiagnosticReadiness::create(a, 0, 0, 0, 11))
        .collect();

    ctx.compare_request_packets(&global, &directed, "6.2.9.4.a");

    assert_eq!(
        listener.messages(Severity::Fail),
        vec!["6.2.9.4.a - Difference compared to data received during global request"]
    );
}

#[test]
fn test_freeze_frame_length_prefix() {
    let dtc = DiagnosticTroubleCode::new(5246, 0, 3, 0).unwrap();
    for samples in [0usize, 1, 17, 200] {
        let frame = FreezeFrame::new(dtc, vec![0xA5; samples]).unwrap();
        let encoded = frame.encode();
        assert_eq!(encoded.len(), 1 + 4 + samples);
        assert_eq!(usize::from(encoded[0]), 4 + samples);
        assert_eq!(FreezeFrame::decode(&encoded).unwrap(), frame);
    }
}
