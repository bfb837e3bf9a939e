//! Store errors.

use pact_types::{AgreementKey, ErrorCode};
use thiserror::Error;

/// Agreement store error.
///
/// Backend failures are recoverable (the next reconciler pass retries
/// the same work); the logical variants describe requests that can
/// never succeed against the current record state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded database failed.
    #[error("storage backend error: {0}")]
    Backend(#[from] redb::Error),

    /// The store directory or file could not be prepared.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// No record exists for the key.
    #[error("agreement {0} not found")]
    NotFound(AgreementKey),

    /// A record already exists for the key.
    #[error("agreement {0} already exists")]
    Duplicate(AgreementKey),

    /// The record is terminated; only deletion is allowed.
    #[error("agreement {0} is terminated and immutable")]
    Terminated(AgreementKey),

    /// Deletion requested before termination.
    #[error("agreement {0} cannot be deleted before termination")]
    NotTerminated(AgreementKey),

    /// The record violates an ordering invariant.
    #[error("invalid agreement record: {0}")]
    InvalidRecord(String),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORE_BACKEND",
            Self::Io(_) => "STORE_IO",
            Self::Codec(_) => "STORE_CODEC",
            Self::NotFound(_) => "STORE_NOT_FOUND",
            Self::Duplicate(_) => "STORE_DUPLICATE",
            Self::Terminated(_) => "STORE_TERMINATED",
            Self::NotTerminated(_) => "STORE_NOT_TERMINATED",
            Self::InvalidRecord(_) => "STORE_INVALID_RECORD",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
