//! Core types for the PACT edge agent.
//!
//! This crate provides the foundational value types shared by every
//! worker in the PACT (Placement Agreement Coordination Toolkit)
//! architecture.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Value Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pact-types    : AgreementKey, reason codes, ErrorCode ◄─── │
//! │  pact-event    : EventId, Message                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Adapter Layer                             │
//! │  pact-store / pact-protocol / pact-registry                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Runtime Layer                             │
//! │  pact-runtime  : event bus, workers, governance             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Identifier Design
//!
//! Agreements are identified by externally assigned opaque strings,
//! unique within an agreement protocol. [`AgreementKey`] pairs the two
//! into the composite primary key used by the durable store and by
//! every log line that mentions an agreement.
//!
//! # Example
//!
//! ```
//! use pact_types::{AgreementKey, CancellationReason};
//!
//! let key = AgreementKey::new("basic", "9a2f3c");
//! assert_eq!(key.slug(), "basic/9a2f3c");
//!
//! let reason = CancellationReason::ContainerFailure;
//! assert_eq!(reason.code(), 203);
//! ```

mod credentials;
mod error;
mod key;
mod reason;

pub use credentials::DeviceCredentials;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use key::AgreementKey;
pub use reason::CancellationReason;
