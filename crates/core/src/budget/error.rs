//! Budget error types.

use chrono::NaiveDate;
use hisab_shared::DomainError;
use hisab_shared::types::{BudgetId, CostCenterId, FiscalYearId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Budget and cost-center errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(BudgetId),

    /// Cost center not found.
    #[error("Cost center not found: {0}")]
    CostCenterNotFound(CostCenterId),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(FiscalYearId),

    /// Allocation amount is zero, negative, or over-precise.
    #[error("Invalid amount {0}: allocations must be positive")]
    InvalidAmount(Decimal),

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Start date is after end date.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Scope does not reference a usable target.
    #[error("Invalid budget scope: {0}")]
    InvalidScope(String),

    /// Lifecycle transition not allowed.
    #[error("Invalid budget status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Budget period has not ended yet.
    #[error("Budget {budget_id} runs until {end_date} and cannot be completed yet")]
    PeriodNotEnded {
        /// The budget.
        budget_id: BudgetId,
        /// Last day of its period.
        end_date: NaiveDate,
    },

    /// Budget is completed and no longer changes.
    #[error("Budget {0} is completed and frozen")]
    Frozen(BudgetId),

    /// Cost center code already exists.
    #[error("Cost center code already exists: {0}")]
    DuplicateCode(String),
}

impl DomainError for BudgetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::CostCenterNotFound(_) | Self::FiscalYearNotFound(_) => {
                "NOT_FOUND"
            },
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidScope(_) => "INVALID_SCOPE",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::PeriodNotEnded { .. } => "PERIOD_NOT_ENDED",
            Self::Frozen(_) => "BUDGET_FROZEN",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_)
            | Self::NegativeAmount
            | Self::InvalidInput(_)
            | Self::InvalidDateRange { .. } => 400,
            Self::NotFound(_) | Self::CostCenterNotFound(_) | Self::FiscalYearNotFound(_) => 404,
            Self::DuplicateCode(_) | Self::Frozen(_) => 409,
            Self::InvalidScope(_)
            | Self::InvalidStatusTransition { .. }
            | Self::PeriodNotEnded { .. } => 422,
        }
    }
}
