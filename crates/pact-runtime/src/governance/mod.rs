//! Agreement governance.
//!
//! The governance worker owns the established-agreement state machine.
//! Two long-lived activities share it:
//!
//! - the **reconciler**: a periodic scan of active agreements that
//!   confirms ledger finalization, reports finalized agreements to the
//!   marketplace registry, asks the container subsystem to probe
//!   executing workloads, and cancels agreements that outlive their
//!   finalization or launch windows;
//! - the **command processor**: the worker half reacting to bus
//!   messages (device registration, container execution outcomes,
//!   artifact-fetch failures, user cancellation requests).
//!
//! Both funnel every teardown through the ordered cancellation
//! pipeline, and both announce a completed
//! cancellation with a single `GovernanceCancelation` message so the
//! container subsystem tears the workloads down exactly once.

mod cancel;
mod command;
mod reconciler;

pub use command::GovernanceCommand;

use crate::bus::EventBus;
use crate::config::PactConfig;
use crate::worker::{Worker, WorkerHandle, WorkerRuntime};
use pact_event::{EndContractCause, Message};
use pact_protocol::{LedgerHandle, ProtocolHandler, PROTOCOL_NAME};
use pact_registry::Registry;
use pact_store::AgreementStore;
use pact_types::{CancellationReason, DeviceCredentials};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Pause between reconciler passes. Long enough that one pass's
/// cancellations are visible to the next, so no duplicates are sent.
pub const RECONCILER_PERIOD: Duration = Duration::from_secs(10);

/// Fixed back-off between transient registry retries inside the
/// cancellation pipeline.
pub const REGISTRY_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Longest a provider may leave an agreement unconfigured.
pub const MAX_CONTRACT_UNCONFIGURED_TIME: Duration = Duration::from_secs(20 * 60);

/// Longest an accepted agreement may sit finalized without its
/// workloads launching.
pub const MAX_CONTRACT_PRELAUNCH_TIME: Duration = Duration::from_secs(60 * 60);

/// Longest to wait for counter-party acceptance once workloads run.
pub const MAX_AGREEMENT_ACCEPTANCE_WAIT_TIME: Duration = Duration::from_secs(20 * 60);

/// Longest an agreement may run without a micropayment. Reserved; not
/// yet enforced.
pub const MAX_MICROPAYMENT_UNPAID_RUN_DURATION: Duration = Duration::from_secs(60 * 60);

/// The governance worker.
///
/// Constructed with its collaborators, then [`start`](Self::start)ed,
/// which spawns the command processor pair and the reconciler task.
pub struct GovernanceWorker {
    inner: Arc<GovernanceInner>,
}

pub(crate) struct GovernanceInner {
    pub(crate) protocol_name: String,
    pub(crate) agreement_timeout_s: u64,
    pub(crate) store: AgreementStore,
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) protocol: Arc<dyn ProtocolHandler>,
    pub(crate) bus: EventBus,
    /// Written by the processor on `DeviceRegistered`, read by the
    /// reconciler.
    pub(crate) device: RwLock<Option<DeviceCredentials>>,
    /// Written once by the reconciler after base-contract init, read
    /// by the cancellation pipeline.
    pub(crate) ledger: RwLock<Option<LedgerHandle>>,
}

impl GovernanceWorker {
    /// Creates a governance worker for the given protocol.
    #[must_use]
    pub fn new(
        protocol_name: impl Into<String>,
        agreement_timeout_s: u64,
        store: AgreementStore,
        registry: Arc<dyn Registry>,
        protocol: Arc<dyn ProtocolHandler>,
        bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(GovernanceInner {
                protocol_name: protocol_name.into(),
                agreement_timeout_s,
                store,
                registry,
                protocol,
                bus,
                device: RwLock::new(None),
                ledger: RwLock::new(None),
            }),
        }
    }

    /// Creates a governance worker for the built-in protocol using
    /// process configuration.
    #[must_use]
    pub fn from_config(
        config: &PactConfig,
        store: AgreementStore,
        registry: Arc<dyn Registry>,
        protocol: Arc<dyn ProtocolHandler>,
        bus: EventBus,
    ) -> Self {
        Self::new(
            PROTOCOL_NAME,
            config.agreement_timeout_s,
            store,
            registry,
            protocol,
            bus,
        )
    }

    /// Starts the command processor and the reconciler.
    #[must_use]
    pub fn start(self) -> GovernanceHandle {
        let inner = Arc::clone(&self.inner);
        let bus = inner.bus.clone();

        let worker = WorkerRuntime::spawn(self, &bus);
        let reconciler = tokio::spawn(reconciler::run(inner));

        GovernanceHandle { worker, reconciler }
    }
}

impl Worker for GovernanceWorker {
    type Command = GovernanceCommand;

    fn name(&self) -> &'static str {
        "governance"
    }

    fn map_event(message: &Message) -> Option<GovernanceCommand> {
        match message {
            Message::EdgeRegistered {
                device_id, token, ..
            } => Some(GovernanceCommand::DeviceRegistered {
                credentials: DeviceCredentials::new(device_id.clone(), token.clone()),
            }),

            Message::ContainerExecutionBegun {
                protocol,
                agreement_id,
                deployment,
                ..
            } => Some(GovernanceCommand::StartGovernExecution {
                protocol: protocol.clone(),
                agreement_id: agreement_id.clone(),
                deployment: deployment.clone(),
            }),

            Message::ContainerExecutionFailed {
                protocol,
                agreement_id,
                deployment,
                ..
            } => Some(GovernanceCommand::CleanupExecution {
                protocol: protocol.clone(),
                agreement_id: agreement_id.clone(),
                reason: CancellationReason::ContainerFailure,
                deployment: Some(deployment.clone()),
            }),

            Message::TorrentFailure { launch_context, .. } => {
                Some(GovernanceCommand::CleanupExecution {
                    protocol: launch_context.protocol.clone(),
                    agreement_id: launch_context.agreement_id.clone(),
                    reason: CancellationReason::TorrentFailure,
                    deployment: None,
                })
            }

            Message::ApiAgreementCancelation {
                event,
                protocol,
                agreement_id,
                deployment,
                ..
            } if *event == pact_event::EventId::AgreementEnded => {
                Some(GovernanceCommand::CleanupExecution {
                    protocol: protocol.clone(),
                    agreement_id: agreement_id.clone(),
                    reason: CancellationReason::UserRequested,
                    deployment: deployment.clone(),
                })
            }

            _ => None,
        }
    }

    async fn process(&mut self, command: GovernanceCommand) {
        match command {
            GovernanceCommand::DeviceRegistered { credentials } => {
                info!(device = %credentials, "device registered with marketplace");
                *self.inner.device.write() = Some(credentials);
            }

            GovernanceCommand::StartGovernExecution {
                protocol,
                agreement_id,
                deployment,
            } => {
                info!(protocol, agreement_id, "starting governance on executing agreement");
                if let Err(err) = self
                    .inner
                    .store
                    .agreement_state_execution_started(&protocol, &agreement_id, deployment)
                    .await
                {
                    error!(
                        protocol,
                        agreement_id,
                        error = %err,
                        "failed to record execution start"
                    );
                }
            }

            GovernanceCommand::CleanupExecution {
                protocol,
                agreement_id,
                reason,
                deployment,
            } => {
                info!(protocol, agreement_id, %reason, "ending agreement");
                let newly_terminated = self
                    .inner
                    .cancel_agreement(&protocol, &agreement_id, reason)
                    .await;

                // Tell the container subsystem in case workloads started.
                if newly_terminated {
                    self.inner.bus.publish(Message::governance_cancelation(
                        EndContractCause::AgTerminated,
                        protocol,
                        agreement_id,
                        deployment,
                    ));
                }
            }
        }
    }
}

/// Handle to a running governance worker.
pub struct GovernanceHandle {
    /// The command processor pair.
    pub worker: WorkerHandle,
    /// The reconciler task.
    pub reconciler: JoinHandle<()>,
}

impl GovernanceHandle {
    /// Aborts every governance task.
    pub fn abort(&self) {
        self.worker.abort();
        self.reconciler.abort();
    }
}
