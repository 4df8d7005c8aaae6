//! Report error types.

use hisab_shared::DomainError;
use hisab_shared::types::ChartAccountId;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// An entry references a chart account missing from the chart.
    #[error("Chart account not found: {0}")]
    AccountNotFound(ChartAccountId),
}

impl DomainError for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "REPORT_ACCOUNT_NOT_FOUND",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 500,
        }
    }
}
