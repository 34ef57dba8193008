//! 6.12.9 DM11: Diagnostic data clear/reset for active DTCs
//!
//! A destination-specific clear must be refused by every OBD module and must
//! leave the diagnostic information intact. The following global clear may be
//! acknowledged; either way no module may erase partially and the modules
//! must agree on whether they erased.

use async_trait::async_trait;
use j1939_packets::{address_name, DiagnosticMessage};

use crate::error::StepResult;
use crate::step::{StepContext, StepController, StepIdentity};
use crate::verifier::ErasureVerifier;

pub struct Part12Step09;

#[async_trait]
impl StepController for Part12Step09 {
    fn identity(&self) -> StepIdentity {
        StepIdentity::new(12, 9, 0)
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()> {
        let verifier = ErasureVerifier::for_step(ctx);
        let listener = ctx.listener().as_ref();

        // 6.12.9.1.a DS DM11 to each OBD ECU
        for address in ctx.obd_addresses() {
            let ack = ctx.comms().request_dm11_directed(address).await?;
            if !ack.is_some_and(|a| a.is_nack()) {
                ctx.add_failure(format!(
                    "6.12.9.2.a - OBD module {} did not provide a NACK for the DS query",
                    address_name(address)
                ));
            }
        }

        ctx.settle("6.12.9.1.b", ctx.settle_seconds()).await;
        verifier
            .verify_data_not_partial_erased(listener, "6.12.9.2.b", "6.12.9.2.c")
            .await?;

        // 6.12.9.3.a Global DM11
        for ack in ctx.comms().request_dm11_global().await? {
            let name = address_name(ack.source_address());
            if ack.is_nack() {
                ctx.add_failure(format!("6.12.9.4.a - {} responded with a NACK", name));
            } else {
                ctx.add_warning(format!("6.12.9.4.b - {} responded with a ACK", name));
            }
        }

        ctx.settle("6.12.9.3.b", ctx.settle_seconds()).await;
        verifier
            .verify_data_not_partial_erased(listener, "6.12.9.4.c", "6.12.9.4.d")
            .await?;
        Ok(())
    }
}
