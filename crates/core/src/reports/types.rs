//! Report data types.

use chrono::{DateTime, NaiveDate, Utc};
use hisab_shared::types::{AccountId, ChartAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chart::{ChartAccountStatus, ChartAccountType};

/// One chart account's row in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Chart account ID.
    pub chart_account_id: ChartAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: ChartAccountType,
    /// Account status at report time.
    pub status: ChartAccountStatus,
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Balance signed by the type's normal side.
    pub balance: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Entries dated on or before this day are included.
    pub as_of: NaiveDate,
    /// Whether zero-balance accounts are listed.
    pub include_zero_balance: bool,
    /// One line per chart account, ordered by code.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub difference: Decimal,
    /// `difference == 0`.
    pub is_balanced: bool,
}

/// Comparison of one asset chart account against the money accounts rolled
/// up to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationLine {
    /// Asset chart account.
    pub chart_account_id: ChartAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Debit-normal balance from the journal.
    pub ledger_balance: Decimal,
    /// Sum of `current_balance` over linked money accounts.
    pub accounts_balance: Decimal,
    /// `ledger_balance - accounts_balance`.
    pub difference: Decimal,
    /// Money accounts linked to the chart account.
    pub account_ids: Vec<AccountId>,
}

/// A money account whose stored balance disagrees with its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMismatch {
    /// The account.
    pub account_id: AccountId,
    /// Stored balance.
    pub current_balance: Decimal,
    /// Signed sum of its entries.
    pub ledger_balance: Decimal,
}

/// Cross-entity consistency report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// One line per asset chart account.
    pub lines: Vec<ReconciliationLine>,
    /// Accounts whose balance is not the sum of their entries.
    pub account_mismatches: Vec<AccountMismatch>,
    /// Accounts whose chart account is not an asset line.
    pub unlinked_accounts: Vec<AccountId>,
    /// Sum of every money account balance.
    pub total_accounts_balance: Decimal,
    /// Sum of every asset chart account's ledger balance.
    pub total_ledger_balance: Decimal,
    /// True when every line and every account agrees, every account rolls
    /// up to an asset line, and both totals match.
    pub is_reconciled: bool,
}
