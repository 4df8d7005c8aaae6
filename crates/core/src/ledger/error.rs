//! Ledger error types for validation and state errors.
//!
//! This module defines every error a posting, account, or chart-of-accounts
//! operation can return. All of them except `PersistenceFailure` are detected
//! before anything is committed.

use chrono::NaiveDate;
use hisab_shared::DomainError;
use hisab_shared::types::{AccountId, ChartAccountId, FiscalYearId, IdempotencyKey};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is zero, negative, or more precise than the money scale.
    #[error("Invalid amount {0}: must be positive with at most the configured decimal places")]
    InvalidAmount(Decimal),

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from an account to itself")]
    SameAccount,

    /// Malformed input (empty name, bad percentage, negative limit).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Chart account cannot classify this kind of posting.
    #[error("Invalid classification {chart_account_id}: {reason}")]
    InvalidClassification {
        /// The offending chart account.
        chart_account_id: ChartAccountId,
        /// Why it was rejected.
        reason: String,
    },

    /// The configured default deposit account does not exist.
    #[error("No chart account with code {0} is configured for unclassified deposits")]
    MissingDefaultClassification(String),

    // ========== Account Errors ==========
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Identifier that was not found.
        id: String,
    },

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Withdrawal would take the balance below the overdraft limit.
    #[error("Insufficient balance on account {account_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The account ID.
        account_id: AccountId,
        /// Balance plus overdraft allowance.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Account cannot be deactivated while it holds money.
    #[error("Account {account_id} has non-zero balance {balance}")]
    NonZeroBalance {
        /// The account ID.
        account_id: AccountId,
        /// Current balance.
        balance: Decimal,
    },

    /// Lifecycle transition not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // ========== Chart of Accounts Errors ==========
    /// Chart account code already exists.
    #[error("Chart account code already exists: {0}")]
    DuplicateCode(String),

    /// Chart account is posted against, or linked and being reclassified.
    #[error("Chart account {0} is in use and cannot be modified")]
    ChartAccountInUse(ChartAccountId),

    // ========== Fiscal Period Errors ==========
    /// No fiscal year covers the transaction date.
    #[error("No fiscal year found for date {0}")]
    NoFiscalYear(NaiveDate),

    /// Fiscal year is closed, no posting allowed.
    #[error("Fiscal year {fiscal_year_id} is closed, no posting allowed on {date}")]
    PeriodClosed {
        /// Transaction date.
        date: NaiveDate,
        /// The closed fiscal year.
        fiscal_year_id: FiscalYearId,
    },

    // ========== Idempotency Errors ==========
    /// Idempotency key reused with a different payload.
    #[error("Idempotency key {0} was already used for a different request")]
    IdempotencyConflict(IdempotencyKey),

    // ========== Integrity Errors ==========
    /// Double-entry lines of a posting do not balance.
    #[error("Journal is unbalanced: debits ({debits}) != credits ({credits})")]
    UnbalancedJournal {
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// The balance chain of an account is not contiguous.
    #[error("Balance chain broken on account {account_id} at sequence {sequence}: expected {expected}, found {actual}")]
    ChainBroken {
        /// The account ID.
        account_id: AccountId,
        /// Sequence of the offending entry.
        sequence: u64,
        /// Expected balance.
        expected: Decimal,
        /// Balance found.
        actual: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Storage Errors ==========
    /// The commit could not be made durable.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl LedgerError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl DomainError for LedgerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidClassification { .. } | Self::MissingDefaultClassification(_) => {
                "INVALID_CLASSIFICATION"
            }
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::NonZeroBalance { .. } => "NON_ZERO_BALANCE",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::ChartAccountInUse(_) => "CHART_ACCOUNT_IN_USE",
            Self::NoFiscalYear(_) => "NO_FISCAL_YEAR",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::IdempotencyConflict(_) => "IDEMPOTENCY_CONFLICT",
            Self::UnbalancedJournal { .. } => "UNBALANCED_JOURNAL",
            Self::ChainBroken { .. } => "CHAIN_BROKEN",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed requests
            Self::InvalidAmount(_) | Self::SameAccount | Self::InvalidInput(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } => 404,

            // 409 Conflict
            Self::DuplicateCode(_)
            | Self::ChartAccountInUse(_)
            | Self::IdempotencyConflict(_)
            | Self::ConcurrentModification => 409,

            // 422 Unprocessable - business rule violations
            Self::InvalidClassification { .. }
            | Self::MissingDefaultClassification(_)
            | Self::AccountInactive(_)
            | Self::InsufficientBalance { .. }
            | Self::NonZeroBalance { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::NoFiscalYear(_)
            | Self::PeriodClosed { .. } => 422,

            // 500 Internal Server Error
            Self::UnbalancedJournal { .. } | Self::ChainBroken { .. } => 500,

            // 503 Service Unavailable - safe to retry
            Self::PersistenceFailure(_) => 503,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification | Self::PersistenceFailure(_)
        )
    }

    fn public_message(&self) -> String {
        match self {
            Self::PersistenceFailure(_) => {
                "The ledger could not commit the request; retry with the same idempotency key"
                    .to_string()
            }
            Self::ChainBroken { account_id, .. } => {
                format!("Ledger integrity check failed for account {account_id}")
            }
            other => other.to_string(),
        }
    }
}
