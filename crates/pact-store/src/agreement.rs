//! The established agreement record and its derived state.

use pact_event::Deployment;
use pact_types::AgreementKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bilateral agreement this device has committed to.
///
/// Created when a proposal is made, updated as the agreement moves
/// through its lifecycle, deleted after termination. All time fields
/// are unix seconds with `0` meaning "not yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishedAgreement {
    /// Opaque agreement identifier, unique within the protocol.
    pub agreement_id: String,
    /// Agreement protocol name.
    pub protocol: String,
    /// Ledger address of the counter-party; empty until the proposal
    /// is accepted.
    pub counter_party_address: String,
    /// Serialized proposal document, opaque to the store.
    pub proposal: String,
    /// Signature over the proposal, used for ledger verification.
    pub proposal_sig: String,
    /// When the local record was created.
    pub agreement_creation_time: u64,
    /// When the counter-party's proposal was accepted.
    pub agreement_accepted_time: u64,
    /// When the ledger confirmed the agreement.
    pub agreement_finalized_time: u64,
    /// When the workload containers began running.
    pub agreement_execution_start_time: u64,
    /// When the agreement was logically terminated; the record stays
    /// until deletion.
    pub agreement_terminated: u64,
    /// Services currently deployed for this agreement.
    pub current_deployment: Deployment,
}

impl EstablishedAgreement {
    /// Creates a fresh record in the CREATED state.
    #[must_use]
    pub fn new(
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        proposal: impl Into<String>,
        proposal_sig: impl Into<String>,
        creation_time: u64,
    ) -> Self {
        Self {
            agreement_id: agreement_id.into(),
            protocol: protocol.into(),
            counter_party_address: String::new(),
            proposal: proposal.into(),
            proposal_sig: proposal_sig.into(),
            agreement_creation_time: creation_time,
            agreement_accepted_time: 0,
            agreement_finalized_time: 0,
            agreement_execution_start_time: 0,
            agreement_terminated: 0,
            current_deployment: Deployment::new(),
        }
    }

    /// Returns the composite store key of this record.
    #[must_use]
    pub fn key(&self) -> AgreementKey {
        AgreementKey::new(self.protocol.clone(), self.agreement_id.clone())
    }

    /// Whether this record is subject to governance.
    ///
    /// Active means: created, accepted, counter-party known, and not
    /// terminated. Only active records are reconciled; termination
    /// permanently removes a record from this set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.agreement_creation_time != 0
            && self.agreement_accepted_time != 0
            && self.agreement_terminated == 0
            && !self.counter_party_address.is_empty()
    }

    /// Derives the lifecycle state from the time fields.
    #[must_use]
    pub fn lifecycle(&self) -> AgreementLifecycle {
        if self.agreement_terminated != 0 {
            AgreementLifecycle::Terminated
        } else if self.agreement_execution_start_time != 0 {
            AgreementLifecycle::Executing
        } else if self.agreement_finalized_time != 0 {
            AgreementLifecycle::Finalized
        } else if self.agreement_accepted_time != 0 {
            AgreementLifecycle::Accepted
        } else {
            AgreementLifecycle::Created
        }
    }

    /// Checks that the set time fields are monotonically ordered
    /// (creation ≤ accepted ≤ finalized ≤ execution start ≤
    /// terminated, skipping zeros).
    #[must_use]
    pub fn times_are_monotonic(&self) -> bool {
        let times = [
            self.agreement_creation_time,
            self.agreement_accepted_time,
            self.agreement_finalized_time,
            self.agreement_execution_start_time,
            self.agreement_terminated,
        ];
        let mut last = 0u64;
        for t in times {
            if t == 0 {
                continue;
            }
            if t < last {
                return false;
            }
            last = t;
        }
        true
    }
}

impl fmt::Display for EstablishedAgreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.key(), self.lifecycle())
    }
}

/// Lifecycle state derived from an agreement's time fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementLifecycle {
    /// Local record exists; proposal not yet accepted.
    Created,
    /// Proposal accepted by the counter-party.
    Accepted,
    /// Confirmed on the ledger.
    Finalized,
    /// Workload containers are running.
    Executing,
    /// Logically terminated; awaiting deletion.
    Terminated,
}

impl fmt::Display for AgreementLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Accepted => "accepted",
            Self::Finalized => "finalized",
            Self::Executing => "executing",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Record predicate for store queries.
#[derive(Debug, Clone)]
pub enum AgreementFilter {
    /// Match a single agreement id.
    Id(String),
    /// Match records subject to governance, see
    /// [`EstablishedAgreement::is_active`].
    Active,
}

impl AgreementFilter {
    /// Whether the record passes this filter.
    #[must_use]
    pub fn matches(&self, record: &EstablishedAgreement) -> bool {
        match self {
            Self::Id(id) => record.agreement_id == *id,
            Self::Active => record.is_active(),
        }
    }
}
