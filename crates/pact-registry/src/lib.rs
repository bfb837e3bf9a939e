//! Marketplace registry client for the PACT edge agent.
//!
//! The registry is the marketplace's HTTP service tracking per-device
//! agreement state. The governance core publishes two facts to it:
//! "this agreement is finalized" (PUT) and "this agreement is gone"
//! (DELETE). Both operations are idempotent on the registry side.
//!
//! # Error Split
//!
//! Callers decide retry policy, so the client reports exactly one
//! attempt per call and splits failures into transport errors (the
//! request never got a registry answer; retrying may succeed) and
//! response errors (the registry said no; retrying will not help).

mod api;
mod error;
mod http;

pub use api::{PutAgreementState, Registry, AGREEMENT_STATE_FINALIZED};
pub use error::RegistryError;
pub use http::HttpRegistry;
