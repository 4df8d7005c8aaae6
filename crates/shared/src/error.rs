//! The error envelope contract shared by every domain error.
//!
//! Each module keeps its own `thiserror` enum. At the boundary they all
//! collapse into one shape: a stable machine code plus a human-readable
//! message that never carries storage internals.

use serde::{Deserialize, Serialize};

/// Behaviour every domain error exposes to the outer layer.
pub trait DomainError: std::error::Error {
    /// Stable SCREAMING_SNAKE_CASE code for API responses.
    fn error_code(&self) -> &'static str;

    /// HTTP status code a transport layer should use.
    fn http_status_code(&self) -> u16;

    /// Returns true if the same request may succeed when retried.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Message safe to show to a caller.
    fn public_message(&self) -> String {
        self.to_string()
    }
}

/// Canonical error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the request may be retried (with the same idempotency key).
    pub retryable: bool,
}

impl ErrorBody {
    /// Builds the envelope from any domain error.
    pub fn from_error<E: DomainError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.public_message(),
            retryable: error.is_retryable(),
        }
    }
}
