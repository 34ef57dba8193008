//! 6.3.7 DM2: Previously active diagnostic trouble codes

use async_trait::async_trait;
use j1939_packets::messages::Dm2PreviouslyActiveDtcs;
use j1939_packets::{DiagnosticMessage, LampStatus};

use crate::correlate::{directed_acks, directed_packets};
use crate::error::StepResult;
use crate::step::{StepContext, StepController, StepIdentity};

pub struct Part03Step07;

#[async_trait]
impl StepController for Part03Step07 {
    fn identity(&self) -> StepIdentity {
        StepIdentity::new(3, 7, 0)
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()> {
        let global = ctx
            .comms()
            .request_global::<Dm2PreviouslyActiveDtcs>()
            .await?
            .packets;

        for packet in &global {
            let name = packet.module_name();
            if ctx.registry().is_obd_module(packet.source_address()) {
                if packet.has_dtcs() {
                    ctx.add_failure(format!("6.3.7.2.a - OBD ECU {} reported a previously active DTC", name));
                }
                if packet.mil_status() != LampStatus::Off {
                    ctx.add_failure(format!("6.3.7.2.b - OBD ECU {} did not report MIL off", name));
                }
            } else if !matches!(packet.mil_status(), LampStatus::Off | LampStatus::NotSupported) {
                ctx.add_failure(format!(
                    "6.3.7.2.c - Non-OBD ECU {} did not report MIL off or not supported",
                    name
                ));
            }
        }

        let obd_addresses = ctx.obd_addresses();
        let mut responses = Vec::with_capacity(obd_addresses.len());
        for &address in &obd_addresses {
            responses.push(
                ctx.comms()
                    .request_directed::<Dm2PreviouslyActiveDtcs>(address)
                    .await?,
            );
        }

        ctx.compare_request_packets(&global, &directed_packets(&responses), "6.3.7.4.a");
        ctx.check_for_nacks(&global, &directed_acks(&responses), &obd_addresses, "6.3.7.4.b");
        Ok(())
    }
}
