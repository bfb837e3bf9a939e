//! Agreement protocol interface for the PACT edge agent.
//!
//! An agreement protocol defines how proposals are signed, how
//! agreements are witnessed on the distributed ledger, and how they
//! are terminated. The governance core consumes the protocol purely
//! through the [`ProtocolHandler`] trait; concrete handlers (ledger
//! clients, signers) live outside this workspace and are injected at
//! startup.
//!
//! # Proposal and Policy
//!
//! A serialized proposal embeds, among other things, the terms and
//! conditions policy the two parties agreed on. The governance core
//! only reads one detail out of it: the API spec reference identifying
//! the workload's microservice, which the marketplace registry wants
//! to know when an agreement is finalized.

mod error;
mod handler;
mod policy;
mod proposal;

pub use error::ProtocolError;
pub use handler::{LedgerHandle, ProtocolHandler};
pub use policy::{demarshal_policy, ApiSpec, Policy};
pub use proposal::Proposal;

/// Name of the single built-in agreement protocol.
pub const PROTOCOL_NAME: &str = "basic";
