//! 6.7.4 DM12: Emissions related active DTCs

use async_trait::async_trait;
use j1939_packets::messages::Dm12MilOnDtcs;
use j1939_packets::{DiagnosticMessage, LampStatus};

use crate::correlate::{directed_acks, directed_packets};
use crate::error::StepResult;
use crate::step::{StepContext, StepController, StepIdentity};

pub struct Part07Step04;

#[async_trait]
impl StepController for Part07Step04 {
    fn identity(&self) -> StepIdentity {
        StepIdentity::new(7, 4, 0)
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()> {
        // 6.7.4.1.a DS DM12 to each OBD ECU
        let obd_addresses = ctx.obd_addresses();
        let mut responses = Vec::with_capacity(obd_addresses.len());
        for &address in &obd_addresses {
            responses.push(ctx.comms().request_directed::<Dm12MilOnDtcs>(address).await?);
        }
        let packets = directed_packets(&responses);

        for packet in &packets {
            if packet.has_dtcs() {
                ctx.add_failure(format!(
                    "6.7.4.2.a - OBD ECU {} reported an active DTC",
                    packet.module_name()
                ));
            }
            if packet.mil_status() != LampStatus::Off {
                ctx.add_failure(format!(
                    "6.7.4.2.b - OBD ECU {} did not report MIL off",
                    packet.module_name()
                ));
            }
        }

        if packets.is_empty() {
            ctx.add_failure("6.7.4.2.c - No OBD ECU supports DM12");
        }

        // there is no global request here; a module that answered DS counts as responding
        ctx.check_for_nacks(&packets, &directed_acks(&responses), &obd_addresses, "6.7.4.1.d");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use j1939_core::{ModuleInfo, ModuleRegistry, Severity};
    use j1939_packets::{pgn, DiagnosticTroubleCode};
    use j1939_sim::{Reply, SimModule, SimulatedVehicle};
    use pretty_assertions::assert_eq;

    use crate::step::test_support::context;

    #[tokio::test]
    async fn test_active_dtc_and_mil() {
        let dtc = DiagnosticTroubleCode::new(3226, 2, 1, 0).unwrap();
        let vehicle = SimulatedVehicle::new()
            .with_module(SimModule::new(0).obd().with_message(&Dm12MilOnDtcs::create(0, LampStatus::On, &[dtc])))
            .with_module(SimModule::new(0x3D).obd().respond(pgn::DM12, Reply::Nack));
        let registry = ModuleRegistry::from_modules([ModuleInfo::obd(0), ModuleInfo::obd(0x3D)]);
        let (ctx, listener) = context(Part07Step04.identity(), Arc::new(vehicle), registry);

        Part07Step04.run(&ctx).await.unwrap();

        assert_eq!(
            listener.messages(Severity::Fail),
            vec![
                "6.7.4.2.a - OBD ECU Engine #1 (0) reported an active DTC",
                "6.7.4.2.b - OBD ECU Engine #1 (0) did not report MIL off",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_support_and_missing_nack() {
        let vehicle = SimulatedVehicle::new()
            .with_module(SimModule::new(0).obd().respond(pgn::DM12, Reply::Nack))
            .with_module(SimModule::new(1).obd().respond(pgn::DM12, Reply::Silent));
        let registry = ModuleRegistry::from_modules([ModuleInfo::obd(0), ModuleInfo::obd(1)]);
        let (ctx, listener) = context(Part07Step04.identity(), Arc::new(vehicle), registry);

        Part07Step04.run(&ctx).await.unwrap();

        assert_eq!(
            listener.messages(Severity::Fail),
            vec![
                "6.7.4.2.c - No OBD ECU supports DM12",
                "6.7.4.1.d - OBD module Engine #2 (1) did not provide a response to Global query and did not provide a NACK for the DS query",
            ]
        );
    }
}
