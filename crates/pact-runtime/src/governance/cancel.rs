//! The ordered cancellation pipeline.
//!
//! Cancelling an agreement reconciles four systems in a fixed order:
//!
//! 1. local store: mark the record terminated
//! 2. marketplace registry: delete the agreement
//! 3. local store: look up the counter-party address
//! 4. ledger: submit the termination
//! 5. local store: delete the record
//!
//! Each step's failure is logged and the pipeline proceeds; partial
//! reconciliation beats orphaning. Re-entry is impossible once step 1
//! lands, because a terminated record no longer matches the active
//! filter the reconciler scans with.

use super::{GovernanceInner, REGISTRY_RETRY_INTERVAL};
use pact_store::AgreementFilter;
use pact_types::{CancellationReason, ErrorCode};
use tracing::{error, info, warn};

impl GovernanceInner {
    /// Runs the cancellation pipeline for one agreement.
    ///
    /// Returns whether this call performed the termination transition.
    /// Exactly one caller per agreement sees `true`; only that caller
    /// announces the cancellation on the bus.
    pub(crate) async fn cancel_agreement(
        &self,
        protocol: &str,
        agreement_id: &str,
        reason: CancellationReason,
    ) -> bool {
        info!(protocol, agreement_id, %reason, "cancelling agreement");

        // 1. Mark the record terminated.
        let newly_terminated = match self
            .store
            .agreement_state_terminated(protocol, agreement_id)
            .await
        {
            Ok((_, newly)) => newly,
            Err(err) => {
                error!(
                    protocol,
                    agreement_id,
                    error = %err,
                    "error marking agreement terminated"
                );
                false
            }
        };

        // 2. Delete from the registry. Transport errors retry forever
        //    on a fixed cadence; a registry rejection is final.
        if let Err(err) = self.delete_from_registry(agreement_id).await {
            error!(
                protocol,
                agreement_id,
                error = %err,
                "error deleting agreement in registry"
            );
        }

        // 3. Counter-party lookup, best effort.
        let counter_party = match self
            .store
            .find_established_agreements(
                protocol,
                &[AgreementFilter::Id(agreement_id.to_string())],
            )
            .await
        {
            Ok(agreements) => agreements
                .first()
                .map(|ag| ag.counter_party_address.clone())
                .unwrap_or_default(),
            Err(err) => {
                error!(
                    protocol,
                    agreement_id,
                    error = %err,
                    "error retrieving agreement for counter-party lookup"
                );
                String::new()
            }
        };

        // 4. Terminate on the ledger.
        let ledger = self.ledger.read().clone();
        match ledger {
            Some(ledger) => {
                if let Err(err) = self
                    .protocol
                    .terminate_agreement(&counter_party, agreement_id, reason, &ledger)
                    .await
                {
                    error!(
                        protocol,
                        agreement_id,
                        error = %err,
                        "error terminating agreement on the ledger"
                    );
                }
            }
            None => warn!(
                protocol,
                agreement_id, "ledger not initialized; skipping ledger termination"
            ),
        }

        // 5. Delete the record.
        if let Err(err) = self
            .store
            .delete_established_agreement(protocol, agreement_id)
            .await
        {
            error!(
                protocol,
                agreement_id,
                error = %err,
                "error deleting terminated agreement"
            );
        }

        newly_terminated
    }

    /// Registry DELETE with unbounded retry on transient transport
    /// failure.
    async fn delete_from_registry(
        &self,
        agreement_id: &str,
    ) -> Result<(), pact_registry::RegistryError> {
        let device = self.device.read().clone();
        let Some(device) = device else {
            warn!(agreement_id, "device not registered; skipping registry delete");
            return Ok(());
        };

        loop {
            match self.registry.delete_agreement(&device, agreement_id).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_recoverable() => {
                    warn!(
                        agreement_id,
                        error = %err,
                        "transient registry failure, retrying"
                    );
                    tokio::time::sleep(REGISTRY_RETRY_INTERVAL).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
