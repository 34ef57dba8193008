//! 6.2.9 DM21: Diagnostic readiness 2

use async_trait::async_trait;
use j1939_packets::messages::Dm21DiagnosticReadiness;
use j1939_packets::DiagnosticMessage;

use crate::correlate::{directed_acks, directed_packets};
use crate::error::StepResult;
use crate::step::{StepContext, StepController, StepIdentity};

pub struct Part02Step09;

#[async_trait]
impl StepController for Part02Step09 {
    fn identity(&self) -> StepIdentity {
        StepIdentity::new(2, 9, 0)
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()> {
        // 6.2.9.1.a Global DM21
        let global = ctx
            .comms()
            .request_global::<Dm21DiagnosticReadiness>()
            .await?
            .packets;

        for packet in &global {
            if packet.km_since_dtcs_cleared().is_some_and(|km| km > 0) {
                ctx.add_failure(format!(
                    "6.2.9.2.a - {} reported > 0 distance SCC (SPN 3294)",
                    packet.module_name()
                ));
            }
        }

        let mil_on_reported = global
            .iter()
            .any(|p| p.minutes_while_mil_on().is_some() || p.km_while_mil_on().is_some());
        if !mil_on_reported {
            ctx.add_failure("6.2.9.2.b - No ECU reported time (SPN 3295) or distance (SPN 3069) with MIL on");
        }

        for packet in &global {
            if packet.minutes_while_mil_on().is_some_and(|m| m > 0) {
                ctx.add_failure(format!(
                    "6.2.9.2.c - {} reported > 0 time with MIL on",
                    packet.module_name()
                ));
            }
            if packet.km_while_mil_on().is_some_and(|km| km > 0) {
                ctx.add_failure(format!(
                    "6.2.9.2.c - {} reported > 0 distance with MIL on",
                    packet.module_name()
                ));
            }
            if packet.minutes_since_dtcs_cleared() == Some(0) {
                ctx.add_failure(format!(
                    "6.2.9.2.d - {} reported zero time SCC (SPN 3296)",
                    packet.module_name()
                ));
            }
        }

        let registry = ctx.registry();
        let time_scc_missing = global
            .iter()
            .filter(|p| registry.is_obd_module(p.source_address()))
            .all(|p| p.minutes_since_dtcs_cleared().is_none());
        if time_scc_missing {
            ctx.add_warning("6.2.9.2.e - No OBD ECU reported time (SPN 3296) for DM21");
        }

        // 6.2.9.3.a DS DM21 to each OBD ECU
        let obd_addresses = ctx.obd_addresses();
        let mut responses = Vec::with_capacity(obd_addresses.len());
        for &address in &obd_addresses {
            responses.push(
                ctx.comms()
                    .request_directed::<Dm21DiagnosticReadiness>(address)
                    .await?,
            );
        }

        ctx.compare_request_packets(&global, &directed_packets(&responses), "6.2.9.4.a");
        ctx.check_for_nacks(&global, &directed_acks(&responses), &obd_addresses, "6.2.9.4.b");
        Ok(())
    }
}
