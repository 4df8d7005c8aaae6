//! Fiscal year error types.

use chrono::NaiveDate;
use hisab_shared::DomainError;
use hisab_shared::types::FiscalYearId;
use thiserror::Error;

/// Errors from fiscal year lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalError {
    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    NotFound(FiscalYearId),

    /// Fiscal year is already closed.
    #[error("Fiscal year {0} is already closed")]
    AlreadyClosed(FiscalYearId),

    /// Fiscal year is not closed, so it cannot be reopened.
    #[error("Fiscal year {0} is not closed")]
    NotClosed(FiscalYearId),

    /// Start date is not before end date.
    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Date range overlaps an existing fiscal year.
    #[error("Date range overlaps fiscal year {existing}")]
    OverlappingYear {
        /// The fiscal year already covering part of the range.
        existing: FiscalYearId,
    },

    /// Malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError for FiscalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyClosed(_) => "ALREADY_CLOSED",
            Self::NotClosed(_) => "NOT_CLOSED",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::OverlappingYear { .. } => "OVERLAPPING_YEAR",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. } | Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::AlreadyClosed(_) | Self::NotClosed(_) | Self::OverlappingYear { .. } => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let id = FiscalYearId::new();
        assert_eq!(FiscalError::AlreadyClosed(id).error_code(), "ALREADY_CLOSED");
        assert_eq!(FiscalError::NotClosed(id).http_status_code(), 409);
        assert_eq!(FiscalError::NotFound(id).http_status_code(), 404);
        assert!(!FiscalError::AlreadyClosed(id).is_retryable());
    }
}
