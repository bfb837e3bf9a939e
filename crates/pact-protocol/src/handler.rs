//! The protocol handler seam.

use crate::error::ProtocolError;
use crate::proposal::Proposal;
use async_trait::async_trait;
use pact_types::CancellationReason;
use serde::{Deserialize, Serialize};

/// Handle to the ledger's deployed agreement base contracts.
///
/// Obtained once from [`ProtocolHandler::init_base_contracts`] and
/// passed back on every ledger call. Opaque to the governance core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHandle {
    /// Address of the agreements contract instance.
    pub agreements_address: String,
}

impl LedgerHandle {
    /// Creates a handle for a deployed agreements contract.
    #[must_use]
    pub fn new(agreements_address: impl Into<String>) -> Self {
        Self {
            agreements_address: agreements_address.into(),
        }
    }
}

/// Operations the governance core needs from an agreement protocol.
///
/// Implementations sign, verify and submit against the distributed
/// ledger; the governance core treats every method as a suspension
/// point and never retries inside the handler.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    /// Resolves the ledger's base contracts for this device's account.
    ///
    /// Called once when the reconciler starts; every subsequent ledger
    /// call receives the returned handle.
    async fn init_base_contracts(&self) -> Result<LedgerHandle, ProtocolError>;

    /// Whether the ledger has witnessed the agreement from both
    /// parties.
    async fn verify_agreement_recorded(
        &self,
        agreement_id: &str,
        counter_party: &str,
        proposal_sig: &str,
        ledger: &LedgerHandle,
    ) -> Result<bool, ProtocolError>;

    /// Parses a serialized proposal and authenticates it.
    fn validate_proposal(&self, serialized: &str) -> Result<Proposal, ProtocolError>;

    /// Signs and submits a termination for the agreement.
    async fn terminate_agreement(
        &self,
        counter_party: &str,
        agreement_id: &str,
        reason: CancellationReason,
        ledger: &LedgerHandle,
    ) -> Result<(), ProtocolError>;
}
