//! Workload launch context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Everything the container subsystem needs to launch the workloads of
/// a freshly reached agreement.
///
/// Produced by the agreement worker when a proposal is accepted and
/// carried on [`AgreementReached`](crate::Message::AgreementReached)
/// and [`TorrentFailure`](crate::Message::TorrentFailure) messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementLaunchContext {
    /// Agreement protocol name.
    pub protocol: String,
    /// Agreement identifier within the protocol.
    pub agreement_id: String,
    /// Raw configure document exactly as received from the
    /// counter-party. Producers outside this crate fill it; the core
    /// passes it through untouched.
    #[serde(default)]
    pub configure_raw: Vec<u8>,
    /// Environment variables injected by the platform (not the user).
    #[serde(default)]
    pub environment_additions: BTreeMap<String, String>,
}

impl AgreementLaunchContext {
    /// Creates a launch context for an agreement.
    #[must_use]
    pub fn new(protocol: impl Into<String>, agreement_id: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            configure_raw: Vec::new(),
            environment_additions: BTreeMap::new(),
        }
    }
}

impl fmt::Display for AgreementLaunchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} env additions)",
            self.protocol,
            self.agreement_id,
            self.environment_additions.len()
        )
    }
}
