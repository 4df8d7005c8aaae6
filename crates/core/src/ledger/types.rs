//! Posting request and result types.
//!
//! Each input is one logical transaction. Inputs serialize to canonical JSON,
//! which is what idempotency fingerprints are computed over.

use chrono::NaiveDate;
use hisab_shared::types::{AccountId, ChartAccountId, CostCenterId, IdempotencyKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;

/// Request to deposit money into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositInput {
    /// Receiving account.
    pub account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Calendar date of the deposit.
    pub transaction_date: NaiveDate,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Income, liability or equity account credited by the deposit.
    /// Falls back to the configured default deposit account.
    #[serde(default)]
    pub chart_account_id: Option<ChartAccountId>,
    /// Client idempotency key.
    #[serde(default)]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Request to spend money from an account against an expense account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawInput {
    /// Paying account.
    pub account_id: AccountId,
    /// Positive amount before tax.
    pub amount: Decimal,
    /// Calendar date of the withdrawal.
    pub transaction_date: NaiveDate,
    /// Expense account the spend is classified to.
    pub chart_account_id: ChartAccountId,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Cost center the spend is tagged to.
    #[serde(default)]
    pub cost_center_id: Option<CostCenterId>,
    /// Precomputed VAT/tax percentage (e.g. `15` for 15%).
    #[serde(default)]
    pub tax_percent: Option<Decimal>,
    /// Client idempotency key.
    #[serde(default)]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Request to move money between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    /// Sending account.
    pub from_account_id: AccountId,
    /// Receiving account.
    pub to_account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Calendar date of the transfer.
    pub transaction_date: NaiveDate,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Client idempotency key.
    #[serde(default)]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Both legs of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// `transfer_out` entry on the source account.
    #[serde(rename = "out")]
    pub out_entry: LedgerEntry,
    /// `transfer_in` entry on the destination account.
    #[serde(rename = "in")]
    pub in_entry: LedgerEntry,
}

impl TransferResult {
    /// Both entries in commit order.
    #[must_use]
    pub fn entries(&self) -> [&LedgerEntry; 2] {
        [&self.out_entry, &self.in_entry]
    }
}

/// Result of a committed posting, as remembered for idempotent replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostingResult {
    /// A deposit or withdrawal.
    Single {
        /// The committed entry.
        entry: LedgerEntry,
    },
    /// A transfer.
    Transfer {
        /// Both committed legs.
        result: TransferResult,
    },
}

impl PostingResult {
    /// Every entry of the posting.
    #[must_use]
    pub fn entries(&self) -> Vec<&LedgerEntry> {
        match self {
            Self::Single { entry } => vec![entry],
            Self::Transfer { result } => result.entries().to_vec(),
        }
    }
}
