//! Protocol layer errors.

use pact_types::ErrorCode;
use thiserror::Error;

/// Agreement protocol error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A proposal or embedded policy could not be parsed.
    #[error("protocol decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A proposal failed signature verification.
    #[error("proposal not authentic: {0}")]
    Unauthenticated(String),

    /// The ledger could not be reached or answered abnormally.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// The ledger base contracts could not be initialized.
    #[error("base contract initialization failed: {0}")]
    ContractInit(String),
}

impl ErrorCode for ProtocolError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "PROTOCOL_DECODE",
            Self::Unauthenticated(_) => "PROTOCOL_UNAUTHENTICATED",
            Self::Ledger(_) => "PROTOCOL_LEDGER",
            Self::ContractInit(_) => "PROTOCOL_CONTRACT_INIT",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Ledger nodes catch up; signatures and malformed documents
        // do not.
        matches!(self, Self::Ledger(_))
    }
}
