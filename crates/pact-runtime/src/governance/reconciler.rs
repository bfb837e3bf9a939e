//! The periodic agreement reconciler.

use super::{GovernanceInner, MAX_CONTRACT_PRELAUNCH_TIME, RECONCILER_PERIOD};
use pact_event::{EndContractCause, Message};
use pact_protocol::{demarshal_policy, LedgerHandle};
use pact_registry::PutAgreementState;
use pact_store::{now_unix, AgreementFilter, EstablishedAgreement};
use pact_types::CancellationReason;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The reconciler task body.
///
/// Initializes the ledger base contracts once, then scans active
/// agreements every [`RECONCILER_PERIOD`]. If the base contracts
/// cannot be initialized the task logs and returns; governance of
/// existing agreements resumes on the next process start.
pub(crate) async fn run(inner: Arc<GovernanceInner>) {
    let ledger = match inner.protocol.init_base_contracts().await {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "unable to initialize ledger base contracts; reconciler disabled");
            return;
        }
    };
    *inner.ledger.write() = Some(ledger.clone());

    loop {
        inner.reconcile_pass(&ledger).await;
        // long enough that a pass's cancellations are visible to the
        // next pass, so no duplicate cancelations are sent
        tokio::time::sleep(RECONCILER_PERIOD).await;
    }
}

impl GovernanceInner {
    /// One scan over the active agreements of this worker's protocol.
    pub(crate) async fn reconcile_pass(&self, ledger: &LedgerHandle) {
        debug!("governing pending agreements");

        let agreements = match self
            .store
            .find_established_agreements(&self.protocol_name, &[AgreementFilter::Active])
            .await
        {
            Ok(agreements) => agreements,
            Err(err) => {
                error!(error = %err, "unable to retrieve active agreements");
                return;
            }
        };

        for agreement in agreements {
            if agreement.agreement_finalized_time == 0 {
                self.govern_pending_finalization(&agreement, ledger).await;
            } else {
                self.govern_finalized(&agreement).await;
            }
        }
    }

    /// Handles an agreement still waiting for ledger confirmation.
    async fn govern_pending_finalization(
        &self,
        agreement: &EstablishedAgreement,
        ledger: &LedgerHandle,
    ) {
        debug!(agreement = %agreement.key(), "checking agreement for finalization");

        let recorded = match self
            .protocol
            .verify_agreement_recorded(
                &agreement.agreement_id,
                &agreement.counter_party_address,
                &agreement.proposal_sig,
                ledger,
            )
            .await
        {
            Ok(recorded) => recorded,
            Err(err) => {
                error!(
                    agreement = %agreement.key(),
                    error = %err,
                    "unable to verify agreement on the ledger"
                );
                return;
            }
        };

        if recorded {
            self.record_finalization(agreement).await;
        } else {
            debug!(agreement = %agreement.key(), "agreement not yet final");
            let now = now_unix();
            if agreement.agreement_creation_time + self.agreement_timeout_s < now {
                info!(agreement = %agreement.key(), "agreement timed out before finalization");
                let newly_terminated = self
                    .cancel_agreement(
                        &agreement.protocol,
                        &agreement.agreement_id,
                        CancellationReason::NotFinalizedTimeout,
                    )
                    .await;
                if newly_terminated {
                    self.bus.publish(Message::governance_cancelation(
                        EndContractCause::AgTerminated,
                        agreement.protocol.clone(),
                        agreement.agreement_id.clone(),
                        Some(agreement.current_deployment.clone()),
                    ));
                }
            }
        }
    }

    /// Records a ledger-confirmed agreement locally and in the
    /// registry.
    ///
    /// Registry failures are logged without retry; the record is
    /// already finalized locally and the registry state converges the
    /// next time the marketplace asks.
    async fn record_finalization(&self, agreement: &EstablishedAgreement) {
        info!(agreement = %agreement.key(), "agreement recorded on the ledger");

        if let Err(err) = self
            .store
            .agreement_state_finalized(&agreement.protocol, &agreement.agreement_id)
            .await
        {
            error!(
                agreement = %agreement.key(),
                error = %err,
                "error persisting agreement finalization"
            );
        }

        let proposal = match self.protocol.validate_proposal(&agreement.proposal) {
            Ok(proposal) => proposal,
            Err(err) => {
                error!(agreement = %agreement.key(), error = %err, "could not hydrate proposal");
                return;
            }
        };

        let policy = match demarshal_policy(&proposal.ts_and_cs) {
            Ok(policy) => policy,
            Err(err) => {
                error!(
                    agreement = %agreement.key(),
                    error = %err,
                    "error demarshalling terms-and-conditions policy"
                );
                return;
            }
        };

        let Some(api_spec) = policy.api_specs.first() else {
            error!(agreement = %agreement.key(), "policy names no api specs");
            return;
        };

        let device = self.device.read().clone();
        let Some(device) = device else {
            warn!(
                agreement = %agreement.key(),
                "device not registered; cannot record agreement state in registry"
            );
            return;
        };

        if let Err(err) = self
            .registry
            .put_agreement_state(
                &device,
                &agreement.agreement_id,
                PutAgreementState::finalized(&api_spec.spec_ref),
            )
            .await
        {
            error!(
                agreement = %agreement.key(),
                error = %err,
                "error setting agreement finalized state in registry"
            );
        }
    }

    /// Handles a finalized agreement: probe executing workloads, time
    /// out agreements that never launch.
    async fn govern_finalized(&self, agreement: &EstablishedAgreement) {
        if agreement.agreement_execution_start_time != 0 {
            debug!(agreement = %agreement.key(), "evaluating agreement for compliance");
            self.bus.publish(Message::governance_maintenance(
                agreement.protocol.clone(),
                agreement.agreement_id.clone(),
                agreement.current_deployment.clone(),
            ));
        } else if agreement.agreement_accepted_time + MAX_CONTRACT_PRELAUNCH_TIME.as_secs()
            < now_unix()
        {
            info!(
                agreement = %agreement.key(),
                "terminating agreement; workloads did not launch within the allowed time"
            );
            let newly_terminated = self
                .cancel_agreement(
                    &agreement.protocol,
                    &agreement.agreement_id,
                    CancellationReason::NotExecutedTimeout,
                )
                .await;
            if newly_terminated {
                self.bus.publish(Message::governance_cancelation(
                    EndContractCause::AgTerminated,
                    agreement.protocol.clone(),
                    agreement.agreement_id.clone(),
                    Some(agreement.current_deployment.clone()),
                ));
            }
        }
    }
}
