//! Ledger entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use hisab_shared::types::{
    AccountId, ChartAccountId, CostCenterId, FiscalYearId, IdempotencyKey, LedgerEntryId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a balance movement on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Money coming in from outside.
    Deposit,
    /// Money spent against an expense classification.
    Withdrawal,
    /// Receiving leg of a transfer.
    TransferIn,
    /// Sending leg of a transfer.
    TransferOut,
}

impl EntryType {
    /// Returns true if the entry increases the account balance.
    #[must_use]
    pub const fn is_inflow(self) -> bool {
        matches!(self, Self::Deposit | Self::TransferIn)
    }
}

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalSide {
    /// Debit line.
    Debit,
    /// Credit line.
    Credit,
}

/// One side of the double-entry view of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Chart account posted to.
    pub chart_account_id: ChartAccountId,
    /// Debit or credit.
    pub side: JournalSide,
    /// Positive amount.
    pub amount: Decimal,
}

impl JournalLine {
    /// Debit amount (zero for credit lines).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        match self.side {
            JournalSide::Debit => self.amount,
            JournalSide::Credit => Decimal::ZERO,
        }
    }

    /// Credit amount (zero for debit lines).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        match self.side {
            JournalSide::Debit => Decimal::ZERO,
            JournalSide::Credit => self.amount,
        }
    }
}

/// An immutable record of one signed balance movement on one account.
///
/// Entries are append-only. For any account, entries ordered by `sequence`
/// form a contiguous chain: `balance_before` of entry N+1 equals
/// `balance_after` of entry N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: LedgerEntryId,
    /// Global monotonic commit sequence; orders entries within an account.
    pub sequence: u64,
    /// Account whose balance moved.
    pub account_id: AccountId,
    /// Asset chart account of `account_id` at posting time.
    pub account_chart_id: ChartAccountId,
    /// Classification (expense for withdrawals, income/liability/equity for
    /// deposits). `None` for transfer legs.
    pub chart_account_id: Option<ChartAccountId>,
    /// Direction.
    pub entry_type: EntryType,
    /// Positive amount, tax included.
    pub amount: Decimal,
    /// Tax portion of `amount`.
    pub tax_amount: Decimal,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
    /// Free-text description.
    pub description: String,
    /// Calendar date the movement belongs to.
    pub transaction_date: NaiveDate,
    /// When the entry was committed.
    pub created_at: DateTime<Utc>,
    /// Other side of a transfer (lookup only, never ownership).
    pub counterparty_account_id: Option<AccountId>,
    /// Fiscal year the entry was posted into.
    pub fiscal_year_id: FiscalYearId,
    /// Cost center the spend is tagged to.
    pub cost_center_id: Option<CostCenterId>,
    /// Client idempotency key of the logical transaction.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for inflows, negative for outflows).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        if self.entry_type.is_inflow() {
            self.amount
        } else {
            -self.amount
        }
    }

    /// Returns true if this entry is spend classified to an expense account.
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.entry_type == EntryType::Withdrawal && self.chart_account_id.is_some()
    }

    /// Double-entry view of this entry.
    ///
    /// - deposit: Dr account chart, Cr classification
    /// - withdrawal: Dr classification, Cr account chart
    /// - transfer_in: Dr account chart
    /// - transfer_out: Cr account chart
    ///
    /// A transfer pair therefore balances across its two entries.
    #[must_use]
    pub fn journal_lines(&self) -> Vec<JournalLine> {
        let own = |side| JournalLine {
            chart_account_id: self.account_chart_id,
            side,
            amount: self.amount,
        };
        let classification = |side| {
            self.chart_account_id.map(|chart_account_id| JournalLine {
                chart_account_id,
                side,
                amount: self.amount,
            })
        };

        match self.entry_type {
            EntryType::Deposit => std::iter::once(own(JournalSide::Debit))
                .chain(classification(JournalSide::Credit))
                .collect(),
            EntryType::Withdrawal => classification(JournalSide::Debit)
                .into_iter()
                .chain(std::iter::once(own(JournalSide::Credit)))
                .collect(),
            EntryType::TransferIn => vec![own(JournalSide::Debit)],
            EntryType::TransferOut => vec![own(JournalSide::Credit)],
        }
    }
}
