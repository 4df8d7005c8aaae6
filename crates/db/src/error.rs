//! Storage error types.

use hisab_core::ledger::LedgerError;
use hisab_shared::DomainError;
use thiserror::Error;

/// Failures of the durable commit log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The log could not be reached or written.
    #[error("Commit log unavailable: {0}")]
    Unavailable(String),

    /// The batch could not be encoded for the log.
    #[error("Commit batch could not be encoded: {0}")]
    Encoding(String),
}

impl DomainError for StorageError {
    fn error_code(&self) -> &'static str {
        "PERSISTENCE_FAILURE"
    }

    fn http_status_code(&self) -> u16 {
        match self {
            Self::Unavailable(_) => 503,
            Self::Encoding(_) => 500,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    fn public_message(&self) -> String {
        "The ledger could not commit the request".to_string()
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}
