//! The registry seam.

use crate::error::RegistryError;
use async_trait::async_trait;
use pact_types::DeviceCredentials;
use serde::{Deserialize, Serialize};

/// Registry-side state of a finalized agreement.
pub const AGREEMENT_STATE_FINALIZED: &str = "Finalized Agreement";

/// Request body for recording an agreement's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutAgreementState {
    /// Spec reference of the agreement's microservice.
    pub microservice: String,
    /// Registry-visible state label.
    pub state: String,
}

impl PutAgreementState {
    /// State body announcing ledger finalization.
    #[must_use]
    pub fn finalized(microservice: impl Into<String>) -> Self {
        Self {
            microservice: microservice.into(),
            state: AGREEMENT_STATE_FINALIZED.to_string(),
        }
    }
}

/// Operations the governance core needs from the marketplace registry.
///
/// Each method performs exactly one attempt. Transport failures come
/// back as the recoverable [`RegistryError::Transport`]; callers own
/// the retry cadence.
#[async_trait]
pub trait Registry: Send + Sync {
    /// `PUT /devices/{device}/agreements/{agreement}`: record the
    /// agreement's state. Idempotent.
    async fn put_agreement_state(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
        body: PutAgreementState,
    ) -> Result<(), RegistryError>;

    /// `DELETE /devices/{device}/agreements/{agreement}`: drop the
    /// agreement. Idempotent.
    async fn delete_agreement(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
    ) -> Result<(), RegistryError>;
}
