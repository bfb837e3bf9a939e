//! Governance command vocabulary.

use pact_event::Deployment;
use pact_types::{CancellationReason, DeviceCredentials};

/// Commands consumed by the governance worker's processor.
///
/// Produced exclusively by the worker's event handler in response to
/// bus messages.
#[derive(Debug, Clone, PartialEq)]
pub enum GovernanceCommand {
    /// The device registered with the marketplace; remember its
    /// credentials for registry calls.
    DeviceRegistered {
        /// Registry identity (Debug output redacts the token).
        credentials: DeviceCredentials,
    },

    /// Containers began running; start governing the agreement's
    /// execution.
    StartGovernExecution {
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services now running.
        deployment: Deployment,
    },

    /// Something ended the agreement; run the cancellation pipeline
    /// and announce the teardown.
    CleanupExecution {
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Why the agreement is being cancelled.
        reason: CancellationReason,
        /// Services to tear down, when known.
        deployment: Option<Deployment>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_device_token() {
        let cmd = GovernanceCommand::DeviceRegistered {
            credentials: DeviceCredentials::new("dev-1", "s3cret"),
        };
        let rendered = format!("{:?}", cmd);
        assert!(rendered.contains("dev-1"));
        assert!(!rendered.contains("s3cret"));
    }
}
