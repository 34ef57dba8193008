//! 6.8.12 DM22: Individual clear/reset of active and previously active DTC
//!
//! With a MIL-on DTC stored, every OBD module must refuse individual clears,
//! destination specific or global, and must keep its diagnostic information.

use async_trait::async_trait;
use j1939_core::DirectedResponse;
use j1939_packets::messages::{Dm12MilOnDtcs, Dm22Control, Dm22IndividualClear};
use j1939_packets::{address_name, AckResponse, Acknowledgment, DiagnosticMessage, DiagnosticTroubleCode, TOOL_ADDRESS};

use crate::correlate::{directed_acks, directed_packets};
use crate::error::StepResult;
use crate::step::{StepContext, StepController, StepIdentity};
use crate::verifier::ErasureVerifier;

/// SPN/FMI sent when there is no particular DTC to clear
const ANY_SPN: u32 = 0x7FFFF;
const ANY_FMI: u8 = 0x1F;

/// Clause numbers and wording for one round of DM22 answers
struct Clause<'a> {
    section: &'a str,
    /// Global answers name the message in the ACK failures
    global: bool,
    /// Also fail CLR_PA_NACK answers carrying a non-zero code
    check_pa_nack_code: bool,
}

impl Clause<'_> {
    fn report_answers(&self, ctx: &StepContext, packets: &[Dm22IndividualClear], acks: &[Acknowledgment]) {
        let with = if self.global { "DM22 with " } else { "" };
        for control in [Dm22Control::ClrPaAck, Dm22Control::ClrActAck] {
            for packet in packets.iter().filter(|p| p.control() == control) {
                ctx.add_failure(format!(
                    "{}.a - {} provided {}{}",
                    self.section,
                    packet.module_name(),
                    with,
                    control
                ));
            }
        }

        for ack in acks.iter().filter(|a| a.response() == AckResponse::Ack) {
            ctx.add_failure(format!(
                "{}.b - {} provided J1939-21 ACK for PGN 49920",
                self.section,
                ack.module_name()
            ));
        }

        let mut nacks = vec![Dm22Control::ClrActNack];
        if self.check_pa_nack_code {
            nacks.push(Dm22Control::ClrPaNack);
        }
        for control in nacks {
            for packet in packets
                .iter()
                .filter(|p| p.control() == control && u8::from(p.ack_code()) > 0)
            {
                ctx.add_failure(format!(
                    "{}.c - {} provided {} with an acknowledgement code greater than 0",
                    self.section,
                    packet.module_name(),
                    control
                ));
            }
        }
    }
}

/// Note every address without a general NACK, then every J1939-21 NACK
fn report_refusals(
    addresses: &[u8],
    packets: &[Dm22IndividualClear],
    acks: &[Acknowledgment],
    section: &str,
    note: impl Fn(String),
) {
    for &address in addresses {
        let refused = packets
            .iter()
            .any(|p| p.source_address() == address && p.is_general_nack());
        if !refused {
            note(format!(
                "{}.a - {} did not provide DM22 CLR_PA_NACK or CLR_ACT_NACK with acknowledgement code of 0",
                section,
                address_name(address)
            ));
        }
    }
    for ack in acks.iter().filter(|a| a.is_nack()) {
        note(format!(
            "{}.b - {} provided J1939-21 NACK for PGN 49920",
            section,
            ack.module_name()
        ));
    }
}

pub struct Part08Step12;

impl Part08Step12 {
    /// MIL-on DTCs each OBD module reports right now; no answer means none
    async fn mil_on_dtcs(ctx: &StepContext) -> StepResult<Vec<(u8, Vec<DiagnosticTroubleCode>)>> {
        let mut dtcs = Vec::new();
        for address in ctx.obd_addresses() {
            let response = ctx.comms().request_directed::<Dm12MilOnDtcs>(address).await?;
            let stored = response.packet().map(|p| p.dtcs().to_vec()).unwrap_or_default();
            dtcs.push((address, stored));
        }
        Ok(dtcs)
    }
}

#[async_trait]
impl StepController for Part08Step12 {
    fn identity(&self) -> StepIdentity {
        StepIdentity::new(8, 12, 0)
    }

    async fn run(&self, ctx: &StepContext) -> StepResult<()> {
        let stored = Self::mil_on_dtcs(ctx).await?;

        // 6.8.12.1.a DS DM22 CLR_ACT_REQ to OBD ECUs without a MIL-on DTC
        let without: Vec<u8> = stored.iter().filter(|(_, d)| d.is_empty()).map(|(a, _)| *a).collect();
        let mut responses: Vec<DirectedResponse<Dm22IndividualClear>> = Vec::with_capacity(without.len());
        for &address in &without {
            let request = Dm22IndividualClear::request(TOOL_ADDRESS, Dm22Control::ClrActReq, ANY_SPN, ANY_FMI);
            responses.push(ctx.comms().send_directed(address, &request).await?);
        }
        let (packets, acks) = (directed_packets(&responses), directed_acks(&responses));

        Clause {
            section: "6.8.12.2",
            global: false,
            check_pa_nack_code: true,
        }
        .report_answers(ctx, &packets, &acks);
        report_refusals(&without, &packets, &acks, "6.8.12.3", |m| ctx.add_info(m));

        // 6.8.12.4.a DS DM22 CLR_PA_REQ for each MIL-on DTC
        let with: Vec<u8> = stored.iter().filter(|(_, d)| !d.is_empty()).map(|(a, _)| *a).collect();
        let mut responses = Vec::new();
        for (address, dtcs) in stored.iter().filter(|(_, d)| !d.is_empty()) {
            for dtc in dtcs {
                let request = Dm22IndividualClear::request(TOOL_ADDRESS, Dm22Control::ClrPaReq, dtc.spn, dtc.fmi);
                responses.push(ctx.comms().send_directed(*address, &request).await?);
            }
        }
        let (packets, acks) = (directed_packets(&responses), directed_acks(&responses));

        // a previously-active refusal may carry its reason, so only ACT_NACK codes fail here
        Clause {
            section: "6.8.12.5",
            global: false,
            check_pa_nack_code: false,
        }
        .report_answers(ctx, &packets, &acks);
        report_refusals(&with, &packets, &acks, "6.8.12.6", |m| ctx.add_warning(m));

        // 6.8.12.7.a Global DM22 CLR_PA_REQ
        let request = Dm22IndividualClear::request(TOOL_ADDRESS, Dm22Control::ClrPaReq, ANY_SPN, ANY_FMI);
        let result = ctx.comms().send_global(&request).await?;
        Clause {
            section: "6.8.12.8",
            global: true,
            check_pa_nack_code: true,
        }
        .report_answers(ctx, &result.packets, &result.acks);

        // 6.8.12.9.a Global DM22 CLR_ACT_REQ
        let request = Dm22IndividualClear::request(TOOL_ADDRESS, Dm22Control::ClrActReq, ANY_SPN, ANY_FMI);
        let result = ctx.comms().send_global(&request).await?;
        Clause {
            section: "6.8.12.10",
            global: true,
            check_pa_nack_code: true,
        }
        .report_answers(ctx, &result.packets, &result.acks);

        ErasureVerifier::for_step(ctx)
            .verify_data_not_erased(ctx.listener().as_ref(), "6.8.12.10.d")
            .await
    }
}
