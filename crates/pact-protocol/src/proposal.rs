//! The agreement proposal document.

use serde::{Deserialize, Serialize};

/// A deserialized agreement proposal.
///
/// The proposal is produced and signed by the counter-party; the
/// governance core stores its serialized form verbatim and only
/// hydrates it to reach the embedded terms-and-conditions policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Agreement id this proposal belongs to.
    #[serde(rename = "agreementId")]
    pub agreement_id: String,
    /// Serialized terms-and-conditions policy both parties signed.
    #[serde(rename = "tsandcs")]
    pub ts_and_cs: String,
    /// The producer's own policy, opaque here.
    #[serde(rename = "producerPolicy", default)]
    pub producer_policy: String,
    /// Ledger address of the proposing party.
    #[serde(rename = "address", default)]
    pub address: String,
}
