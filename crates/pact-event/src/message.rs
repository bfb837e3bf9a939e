//! The bus message sum type.

use crate::deployment::{service_config_names, Deployment};
use crate::id::EventId;
use crate::launch::AgreementLaunchContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome cause attached to end-of-agreement messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndContractCause {
    /// The agreement was terminated before fulfillment.
    AgTerminated,
    /// The agreement ended because of an error.
    AgError,
    /// The agreement ran to completion.
    AgFulfilled,
}

impl fmt::Display for EndContractCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AgTerminated => "AG_TERMINATED",
            Self::AgError => "AG_ERROR",
            Self::AgFulfilled => "AG_FULFILLED",
        };
        f.write_str(s)
    }
}

/// A message on the internal event bus.
///
/// Every variant embeds its own `event` tag; where a variant can be
/// emitted under more than one [`EventId`], consumers must check the
/// embedded tag after matching the variant. Constructors pin the
/// canonical tag for the common cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// The device registered with the marketplace registry and
    /// received its identity.
    EdgeRegistered {
        /// Tag, normally [`EventId::NewDeviceReg`].
        event: EventId,
        /// Registry-assigned device id.
        device_id: String,
        /// Bearer token for registry calls.
        token: String,
    },

    /// An agreement was reached; the container subsystem may start
    /// fetching and configuring the workload.
    AgreementReached {
        /// Tag, normally [`EventId::AgreementReached`].
        event: EventId,
        /// Launch instructions for the workload.
        launch_context: AgreementLaunchContext,
    },

    /// Containers for an agreement began running.
    ContainerExecutionBegun {
        /// Tag, normally [`EventId::ExecutionBegun`].
        event: EventId,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Running services for the agreement.
        deployment: Deployment,
    },

    /// Containers for an agreement failed to run.
    ContainerExecutionFailed {
        /// Tag, normally [`EventId::ExecutionFailed`].
        event: EventId,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services that were being run.
        deployment: Deployment,
    },

    /// Liveness probe report from the container subsystem for one
    /// agreement's services. Ignored by governance.
    ContainerMaintain {
        /// Tag, normally [`EventId::ContainerMaintain`].
        event: EventId,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services probed.
        deployment: Deployment,
    },

    /// Workload artifact fetch failed before launch.
    TorrentFailure {
        /// Tag, normally [`EventId::TorrentFailure`].
        event: EventId,
        /// Launch context of the agreement whose fetch failed.
        launch_context: AgreementLaunchContext,
    },

    /// User-driven cancellation request surfaced by the local API.
    ApiAgreementCancelation {
        /// Tag, normally [`EventId::AgreementEnded`].
        event: EventId,
        /// Why the agreement is ending.
        cause: EndContractCause,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services to tear down, when known.
        deployment: Option<Deployment>,
    },

    /// Governance asks the container subsystem to verify that an
    /// executing agreement's workloads are still alive.
    GovernanceMaintenance {
        /// Tag, normally [`EventId::ContainerMaintain`].
        event: EventId,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services expected to be running.
        deployment: Deployment,
    },

    /// Governance cancelled an agreement; downstream consumers tear
    /// down its workloads.
    GovernanceCancelation {
        /// Tag, normally [`EventId::AgreementEnded`].
        event: EventId,
        /// Why the agreement ended.
        cause: EndContractCause,
        /// Agreement protocol name.
        protocol: String,
        /// Agreement identifier.
        agreement_id: String,
        /// Services to tear down, when known.
        deployment: Option<Deployment>,
    },

    /// A new policy file appeared on the device. Observed by the
    /// policy and agreement workers; governance ignores it.
    PolicyCreated {
        /// Tag, normally [`EventId::NewPolicy`].
        event: EventId,
        /// Path of the policy file.
        policy_file: String,
    },
}

impl Message {
    /// Device registration with the canonical tag.
    #[must_use]
    pub fn edge_registered(device_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::EdgeRegistered {
            event: EventId::NewDeviceReg,
            device_id: device_id.into(),
            token: token.into(),
        }
    }

    /// Agreement reached with the canonical tag.
    #[must_use]
    pub fn agreement_reached(launch_context: AgreementLaunchContext) -> Self {
        Self::AgreementReached {
            event: EventId::AgreementReached,
            launch_context,
        }
    }

    /// Container execution begun with the canonical tag.
    #[must_use]
    pub fn container_execution_begun(
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Deployment,
    ) -> Self {
        Self::ContainerExecutionBegun {
            event: EventId::ExecutionBegun,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Container execution failed with the canonical tag.
    #[must_use]
    pub fn container_execution_failed(
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Deployment,
    ) -> Self {
        Self::ContainerExecutionFailed {
            event: EventId::ExecutionFailed,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Container liveness report with the canonical tag.
    #[must_use]
    pub fn container_maintain(
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Deployment,
    ) -> Self {
        Self::ContainerMaintain {
            event: EventId::ContainerMaintain,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Torrent failure with the canonical tag.
    #[must_use]
    pub fn torrent_failure(launch_context: AgreementLaunchContext) -> Self {
        Self::TorrentFailure {
            event: EventId::TorrentFailure,
            launch_context,
        }
    }

    /// User cancellation request with the canonical tag.
    #[must_use]
    pub fn api_agreement_cancelation(
        cause: EndContractCause,
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Option<Deployment>,
    ) -> Self {
        Self::ApiAgreementCancelation {
            event: EventId::AgreementEnded,
            cause,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Maintenance probe request with the canonical tag.
    #[must_use]
    pub fn governance_maintenance(
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Deployment,
    ) -> Self {
        Self::GovernanceMaintenance {
            event: EventId::ContainerMaintain,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Governance cancellation with the canonical tag.
    #[must_use]
    pub fn governance_cancelation(
        cause: EndContractCause,
        protocol: impl Into<String>,
        agreement_id: impl Into<String>,
        deployment: Option<Deployment>,
    ) -> Self {
        Self::GovernanceCancelation {
            event: EventId::AgreementEnded,
            cause,
            protocol: protocol.into(),
            agreement_id: agreement_id.into(),
            deployment,
        }
    }

    /// Policy file notification with the canonical tag.
    #[must_use]
    pub fn policy_created(policy_file: impl Into<String>) -> Self {
        Self::PolicyCreated {
            event: EventId::NewPolicy,
            policy_file: policy_file.into(),
        }
    }

    /// Returns the embedded event tag.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::EdgeRegistered { event, .. }
            | Self::AgreementReached { event, .. }
            | Self::ContainerExecutionBegun { event, .. }
            | Self::ContainerExecutionFailed { event, .. }
            | Self::ContainerMaintain { event, .. }
            | Self::TorrentFailure { event, .. }
            | Self::ApiAgreementCancelation { event, .. }
            | Self::GovernanceMaintenance { event, .. }
            | Self::GovernanceCancelation { event, .. }
            | Self::PolicyCreated { event, .. } => *event,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeRegistered {
                event, device_id, ..
            } => {
                // token deliberately omitted
                write!(f, "{}: device {}", event, device_id)
            }
            Self::AgreementReached {
                event,
                launch_context,
            } => write!(f, "{}: {}", event, launch_context),
            Self::ContainerExecutionBegun {
                event,
                protocol,
                agreement_id,
                deployment,
            }
            | Self::ContainerExecutionFailed {
                event,
                protocol,
                agreement_id,
                deployment,
            }
            | Self::ContainerMaintain {
                event,
                protocol,
                agreement_id,
                deployment,
            }
            | Self::GovernanceMaintenance {
                event,
                protocol,
                agreement_id,
                deployment,
            } => write!(
                f,
                "{}: {}/{} services {:?}",
                event,
                protocol,
                agreement_id,
                service_config_names(deployment)
            ),
            Self::TorrentFailure {
                event,
                launch_context,
            } => write!(f, "{}: {}", event, launch_context),
            Self::ApiAgreementCancelation {
                event,
                cause,
                protocol,
                agreement_id,
                ..
            }
            | Self::GovernanceCancelation {
                event,
                cause,
                protocol,
                agreement_id,
                ..
            } => write!(
                f,
                "{}: {}/{} cause {}",
                event, protocol, agreement_id, cause
            ),
            Self::PolicyCreated { event, policy_file } => {
                write!(f, "{}: {}", event, policy_file)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::ServiceConfig;
    use serde_json::json;

    fn sample_deployment() -> Deployment {
        let mut d = Deployment::new();
        d.insert("svc-a".into(), ServiceConfig::new(json!({"image": "a:1"})));
        d
    }

    #[test]
    fn constructors_pin_canonical_tags() {
        let ctx = AgreementLaunchContext::new("basic", "ag-1");

        assert_eq!(
            Message::edge_registered("dev", "tok").event_id(),
            EventId::NewDeviceReg
        );
        assert_eq!(
            Message::agreement_reached(ctx.clone()).event_id(),
            EventId::AgreementReached
        );
        assert_eq!(
            Message::container_execution_begun("basic", "ag-1", sample_deployment()).event_id(),
            EventId::ExecutionBegun
        );
        assert_eq!(
            Message::container_execution_failed("basic", "ag-1", sample_deployment()).event_id(),
            EventId::ExecutionFailed
        );
        assert_eq!(
            Message::torrent_failure(ctx).event_id(),
            EventId::TorrentFailure
        );
        assert_eq!(
            Message::api_agreement_cancelation(
                EndContractCause::AgTerminated,
                "basic",
                "ag-1",
                None
            )
            .event_id(),
            EventId::AgreementEnded
        );
        assert_eq!(
            Message::governance_maintenance("basic", "ag-1", sample_deployment()).event_id(),
            EventId::ContainerMaintain
        );
        assert_eq!(
            Message::governance_cancelation(
                EndContractCause::AgTerminated,
                "basic",
                "ag-1",
                Some(sample_deployment())
            )
            .event_id(),
            EventId::AgreementEnded
        );
        assert_eq!(
            Message::policy_created("/etc/pact/policy.d/cpu.json").event_id(),
            EventId::NewPolicy
        );
    }

    #[test]
    fn serde_roundtrip() {
        let msg = Message::governance_cancelation(
            EndContractCause::AgTerminated,
            "basic",
            "ag-9",
            Some(sample_deployment()),
        );
        let json = serde_json::to_string(&msg).unwrap();
        let restored: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, msg);
    }

    #[test]
    fn display_omits_token() {
        let msg = Message::edge_registered("dev-1", "s3cret");
        let rendered = msg.to_string();
        assert!(rendered.contains("dev-1"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn display_names_services_only() {
        let msg = Message::governance_maintenance("basic", "ag-1", sample_deployment());
        let rendered = msg.to_string();
        assert!(rendered.contains("svc-a"));
        assert!(!rendered.contains("image"));
    }
}
