//! Stable event identifiers.
//!
//! Event ids for all workers are declared here to keep the constant
//! values unique across the process.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier tag carried by every bus message.
///
/// The wire form is the historical UPPER_SNAKE string; ids are stable
/// across releases because downstream workers dispatch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventId {
    /// Placeholder; never dispatched on.
    Noop,

    // agreement-related
    /// An agreement was reached with a counter-party; workload
    /// download may begin. Not final until witnessed on the ledger.
    AgreementReached,
    /// An agreement ended and its workloads must be torn down.
    AgreementEnded,

    // registry-related
    /// The device registered with the marketplace registry.
    NewDeviceReg,

    // artifact-fetcher related
    /// Workload artifact fetch failed.
    TorrentFailure,
    /// Workload artifacts fetched and verified.
    TorrentFetched,

    // container-related
    /// Containers for an agreement began running.
    ExecutionBegun,
    /// Containers for an agreement failed.
    ExecutionFailed,
    /// Probe request: verify an agreement's containers are alive.
    ContainerMaintain,

    // policy-related
    /// A new policy file appeared on the device.
    NewPolicy,
}

impl EventId {
    /// Returns the stable wire name of this id.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noop => "NOOP",
            Self::AgreementReached => "AGREEMENT_REACHED",
            Self::AgreementEnded => "AGREEMENT_ENDED",
            Self::NewDeviceReg => "NEW_DEVICE_REG",
            Self::TorrentFailure => "TORRENT_FAILURE",
            Self::TorrentFetched => "TORRENT_FETCHED",
            Self::ExecutionBegun => "EXECUTION_BEGUN",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::ContainerMaintain => "CONTAINER_MAINTAIN",
            Self::NewPolicy => "NEW_POLICY",
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
