//! Global versus destination-specific response correlation

use std::collections::{BTreeMap, BTreeSet};

use j1939_core::{DirectedResponse, RequestResult};
use j1939_packets::{address_name, Acknowledgment, CompositeSystem, DiagnosticMessage, DiagnosticReadiness};

use crate::step::StepContext;

impl StepContext {
    /// Fail once if any module's directed response differs byte-wise from its
    /// global response. Only the first divergence is reported.
    pub fn compare_request_packets<M: DiagnosticMessage>(&self, global: &[M], directed: &[M], section: &str) {
        for global_packet in global {
            let address = global_packet.source_address();
            let Some(directed_packet) = directed.iter().find(|p| p.source_address() == address) else {
                continue;
            };
            if directed_packet.packet().bytes() != global_packet.packet().bytes() {
                self.add_failure(format!(
                    "{} - Difference compared to data received during global request",
                    section
                ));
                break;
            }
        }
    }

    /// Fail for every OBD module that neither answered the global request nor
    /// NACKed the directed one. Reported once per address, ascending.
    pub fn check_for_nacks<M: DiagnosticMessage>(
        &self,
        global: &[M],
        directed_acks: &[Acknowledgment],
        obd_addresses: &[u8],
        section: &str,
    ) {
        let mut missing: BTreeSet<u8> = obd_addresses.iter().copied().collect();
        for packet in global {
            missing.remove(&packet.source_address());
        }
        for ack in directed_acks.iter().filter(|a| a.is_nack()) {
            missing.remove(&ack.source_address());
        }
        for address in missing {
            self.add_failure(format!(
                "{} - OBD module {} did not provide a response to Global query and did not provide a NACK for the DS query",
                section,
                address_name(address)
            ));
        }
    }

    /// Warn for every monitor (other than comprehensive component) that more
    /// than one packet reports as enabled
    pub fn report_duplicate_composite_systems<M: DiagnosticReadiness>(&self, packets: &[M], section: &str) {
        let mut claims: BTreeMap<CompositeSystem, usize> = BTreeMap::new();
        for system in packets
            .iter()
            .flat_map(|p| p.monitored_systems())
            .filter(|s| s.status.enabled && s.id != CompositeSystem::ComprehensiveComponent)
        {
            *claims.entry(system.id).or_default() += 1;
        }

        let mut duplicated: Vec<&'static str> = claims
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.name())
            .collect();
        duplicated.sort_unstable();

        for name in duplicated {
            self.add_warning(format!(
                "{} - Required monitor {} is supported by more than one OBD ECU",
                section,
                name.trim()
            ));
        }
    }
}

/// Packets of several global results, in order
pub fn global_packets<M: Clone>(results: &[RequestResult<M>]) -> Vec<M> {
    results.iter().flat_map(|r| r.packets.iter().cloned()).collect()
}

/// Acknowledgments of several global results, in order
pub fn global_acks<M>(results: &[RequestResult<M>]) -> Vec<Acknowledgment> {
    results.iter().flat_map(|r| r.acks.iter().cloned()).collect()
}

/// Packets among directed responses, in order
pub fn directed_packets<M: Clone>(responses: &[DirectedResponse<M>]) -> Vec<M> {
    responses.iter().filter_map(|r| r.packet().cloned()).collect()
}

/// Acknowledgments among directed responses, in order
pub fn directed_acks<M>(responses: &[DirectedResponse<M>]) -> Vec<Acknowledgment> {
    responses.iter().filter_map(|r| r.ack().cloned()).collect()
}
