//! Business rule validation for postings.
//!
//! Every check here runs before anything is committed.

use hisab_shared::types::money::is_valid_amount;
use rust_decimal::Decimal;

use super::entry::JournalLine;
use super::error::LedgerError;
use crate::account::Account;
use crate::chart::{ChartAccountType, ChartOfAccount};

/// Validates a posting amount: positive with at most `scale` decimals.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` otherwise.
pub fn validate_amount(amount: Decimal, scale: u32) -> Result<(), LedgerError> {
    if is_valid_amount(amount, scale) {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

/// Validates that the account accepts postings.
///
/// # Errors
///
/// Returns `LedgerError::AccountInactive` for an inactive account.
pub fn ensure_active(account: &Account) -> Result<(), LedgerError> {
    if account.is_active() {
        Ok(())
    } else {
        Err(LedgerError::AccountInactive(account.id))
    }
}

/// Validates that `requested` can leave the account without breaching its
/// overdraft limit.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientBalance` otherwise.
pub fn ensure_sufficient_balance(account: &Account, requested: Decimal) -> Result<(), LedgerError> {
    let available = account.available();
    if requested > available {
        return Err(LedgerError::InsufficientBalance {
            account_id: account.id,
            available,
            requested,
        });
    }
    Ok(())
}

/// Validates a withdrawal classification: an active expense account.
///
/// # Errors
///
/// Returns `LedgerError::InvalidClassification` otherwise.
pub fn validate_expense_classification(chart: &ChartOfAccount) -> Result<(), LedgerError> {
    if !chart.is_active() {
        return Err(invalid_classification(chart, "chart account is inactive"));
    }
    if chart.account_type != ChartAccountType::Expense {
        return Err(invalid_classification(
            chart,
            &format!("withdrawals need an expense account, got {}", chart.account_type),
        ));
    }
    Ok(())
}

/// Validates a deposit classification: an active income, liability or
/// equity account.
///
/// # Errors
///
/// Returns `LedgerError::InvalidClassification` otherwise.
pub fn validate_deposit_classification(chart: &ChartOfAccount) -> Result<(), LedgerError> {
    if !chart.is_active() {
        return Err(invalid_classification(chart, "chart account is inactive"));
    }
    if !chart.account_type.accepts_deposits() {
        return Err(invalid_classification(
            chart,
            &format!(
                "deposits need an income, liability or equity account, got {}",
                chart.account_type
            ),
        ));
    }
    Ok(())
}

fn invalid_classification(chart: &ChartOfAccount, reason: &str) -> LedgerError {
    LedgerError::InvalidClassification {
        chart_account_id: chart.id,
        reason: reason.to_string(),
    }
}

/// Validates a precomputed tax percentage: between 0 and 100.
///
/// # Errors
///
/// Returns `LedgerError::InvalidInput` otherwise.
pub fn validate_tax_percent(percent: Decimal) -> Result<(), LedgerError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(LedgerError::InvalidInput(format!(
            "tax percentage must be between 0 and 100, got {percent}"
        )));
    }
    Ok(())
}

/// Validates that a set of journal lines is balanced.
///
/// # Errors
///
/// Returns `LedgerError::UnbalancedJournal` if debits and credits differ,
/// `InvalidAmount` for a non-positive line.
pub fn validate_journal(lines: &[JournalLine]) -> Result<(), LedgerError> {
    let mut total_debits = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;

    for line in lines {
        if line.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(line.amount));
        }
        total_debits += line.debit();
        total_credits += line.credit();
    }

    if total_debits != total_credits {
        return Err(LedgerError::UnbalancedJournal {
            debits: total_debits,
            credits: total_credits,
        });
    }

    Ok(())
}
