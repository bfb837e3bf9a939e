//! Agreement cancellation reason codes.
//!
//! The 200-series codes are part of the agreement protocol wire
//! contract: they are submitted to the ledger when an agreement is
//! terminated and must stay stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an agreement was cancelled.
///
/// | Reason | Code |
/// |--------|------|
/// | [`NotFinalizedTimeout`](Self::NotFinalizedTimeout) | 200 |
/// | [`PolicyChanged`](Self::PolicyChanged) | 201 |
/// | [`TorrentFailure`](Self::TorrentFailure) | 202 |
/// | [`ContainerFailure`](Self::ContainerFailure) | 203 |
/// | [`NotExecutedTimeout`](Self::NotExecutedTimeout) | 204 |
/// | [`UserRequested`](Self::UserRequested) | 205 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationReason {
    /// The ledger never recorded the agreement within the configured
    /// timeout.
    NotFinalizedTimeout,
    /// The local policy that produced the agreement changed.
    PolicyChanged,
    /// The workload artifact fetch failed.
    TorrentFailure,
    /// The workload containers failed to run.
    ContainerFailure,
    /// The workload never launched within the pre-launch window.
    NotExecutedTimeout,
    /// The user asked for the agreement to end.
    UserRequested,
}

impl CancellationReason {
    /// Returns the stable wire code for this reason.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::NotFinalizedTimeout => 200,
            Self::PolicyChanged => 201,
            Self::TorrentFailure => 202,
            Self::ContainerFailure => 203,
            Self::NotExecutedTimeout => 204,
            Self::UserRequested => 205,
        }
    }

    /// Looks a reason up by its wire code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            200 => Some(Self::NotFinalizedTimeout),
            201 => Some(Self::PolicyChanged),
            202 => Some(Self::TorrentFailure),
            203 => Some(Self::ContainerFailure),
            204 => Some(Self::NotExecutedTimeout),
            205 => Some(Self::UserRequested),
            _ => None,
        }
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFinalizedTimeout => "not finalized in time",
            Self::PolicyChanged => "policy changed",
            Self::TorrentFailure => "artifact fetch failed",
            Self::ContainerFailure => "container failure",
            Self::NotExecutedTimeout => "not executed in time",
            Self::UserRequested => "user requested",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CancellationReason; 6] = [
        CancellationReason::NotFinalizedTimeout,
        CancellationReason::PolicyChanged,
        CancellationReason::TorrentFailure,
        CancellationReason::ContainerFailure,
        CancellationReason::NotExecutedTimeout,
        CancellationReason::UserRequested,
    ];

    #[test]
    fn codes_are_stable() {
        let codes: Vec<u32> = ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![200, 201, 202, 203, 204, 205]);
    }

    #[test]
    fn code_roundtrip() {
        for reason in ALL {
            assert_eq!(CancellationReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(CancellationReason::from_code(199), None);
        assert_eq!(CancellationReason::from_code(206), None);
    }

    #[test]
    fn display_includes_code() {
        assert!(CancellationReason::ContainerFailure
            .to_string()
            .contains("203"));
    }
}
