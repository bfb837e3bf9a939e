//! Bus message types for the PACT edge agent.
//!
//! Every internal worker communicates over a shared broadcast bus, and
//! every value on that bus is a [`Message`]. This crate defines the
//! message sum type, the stable [`EventId`] tags the workers dispatch
//! on, and the payload types that ride along (deployments, launch
//! contexts).
//!
//! # Message Flow
//!
//! ```text
//! container worker ──ContainerExecutionBegun──►┐
//! torrent worker ─────TorrentFailure──────────►│
//! api worker ─────ApiAgreementCancelation─────►│ EventBus
//!                                              │
//!          ┌──GovernanceCancelation◄───────────┤
//!          │  GovernanceMaintenance◄───────────┘
//!          ▼
//! container worker (tear down / probe workloads)
//! ```
//!
//! # Tagged Variants
//!
//! Each [`Message`] variant carries its own `event` tag. Dispatchers
//! match on the variant first and on the embedded [`EventId`] second,
//! because some variants are emitted under more than one tag (a
//! container message is `EXECUTION_BEGUN` or `EXECUTION_FAILED`). The
//! variant's embedded tag is authoritative.

mod deployment;
mod id;
mod launch;
mod message;

pub use deployment::{service_config_names, Deployment, ServiceConfig};
pub use id::EventId;
pub use launch::AgreementLaunchContext;
pub use message::{EndContractCause, Message};
