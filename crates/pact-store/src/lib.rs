//! Durable agreement store for the PACT edge agent.
//!
//! Established agreements are the device's source of truth for what it
//! has committed to run. They survive restarts in an embedded
//! [redb](https://docs.rs/redb) database and every mutation goes
//! through a single short-lived write transaction, so the governance
//! reconciler and the command processor can share the store without
//! coordinating beyond the transaction boundary.
//!
//! # Lifecycle
//!
//! The record's lifecycle is encoded in its unix-second time fields
//! (`0` means unset):
//!
//! ```text
//! CREATED ──► ACCEPTED ──► FINALIZED ──► EXECUTING ──► TERMINATED ──► (deleted)
//!                  └──────────┴──────────────┴── cancel ──┘
//! ```
//!
//! Time fields only move forward, a terminated record is immutable
//! except for deletion, and deletion is refused before termination.

mod agreement;
mod error;
mod store;

pub use agreement::{AgreementFilter, AgreementLifecycle, EstablishedAgreement};
pub use error::StoreError;
pub use store::AgreementStore;

/// Current unix time in whole seconds.
#[must_use]
pub fn now_unix() -> u64 {
    let now = chrono::Utc::now().timestamp();
    u64::try_from(now).unwrap_or(0)
}
