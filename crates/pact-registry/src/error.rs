//! Registry client errors.

use pact_types::ErrorCode;
use thiserror::Error;

/// Marketplace registry error.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request never produced a registry answer (connect failure,
    /// timeout, interrupted body).
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry rejected request: status {status}: {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body, if readable.
        message: String,
    },
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "REGISTRY_TRANSPORT",
            Self::Response { .. } => "REGISTRY_RESPONSE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
