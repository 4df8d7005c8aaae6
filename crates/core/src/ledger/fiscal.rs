//! Fiscal period validation for postings.

use chrono::NaiveDate;
use hisab_shared::types::FiscalYearId;

use crate::fiscal::{FiscalYear, FiscalYearStatus, find_for_date};
use crate::ledger::error::LedgerError;

/// Resolves the fiscal year a posting dated `date` belongs to.
///
/// Fiscal Period Posting Rules:
/// - OPEN / REOPENED → posting allowed
/// - CLOSED → no one can post
/// - no covering year → posting rejected
///
/// # Errors
///
/// * `LedgerError::NoFiscalYear` if no year covers `date`
/// * `LedgerError::PeriodClosed` if the covering year is closed
pub fn resolve_posting_year(
    years: &[FiscalYear],
    date: NaiveDate,
) -> Result<FiscalYearId, LedgerError> {
    let year = find_for_date(years, date).ok_or(LedgerError::NoFiscalYear(date))?;
    validate_posting_permission(year.status, date, year.id)?;
    Ok(year.id)
}

/// Checks whether a year in `status` accepts a posting dated `date`.
///
/// # Errors
///
/// Returns `LedgerError::PeriodClosed` for a closed year.
pub fn validate_posting_permission(
    status: FiscalYearStatus,
    date: NaiveDate,
    fiscal_year_id: FiscalYearId,
) -> Result<(), LedgerError> {
    match status {
        FiscalYearStatus::Open | FiscalYearStatus::Reopened => Ok(()),
        FiscalYearStatus::Closed => Err(LedgerError::PeriodClosed {
            date,
            fiscal_year_id,
        }),
    }
}
