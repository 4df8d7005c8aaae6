//! Account data types.

use chrono::{DateTime, Utc};
use hisab_shared::types::{AccountId, ChartAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chart::{ChartAccountType, ChartOfAccount};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::error::LedgerError;

/// Kind of money account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Physical cash box.
    Cash,
    /// Bank account.
    Bank,
    /// bKash mobile wallet.
    Bkash,
    /// Nagad mobile wallet.
    Nagad,
    /// Rocket mobile wallet.
    Rocket,
    /// Anything else.
    Other,
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Accepts postings.
    Active,
    /// Soft-deleted; kept for history and reporting.
    Inactive,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// A money account (cash, bank, mobile wallet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Display name (e.g. "Cash Box").
    pub name: String,
    /// Kind of account.
    pub account_type: AccountType,
    /// Bank or wallet number, if any.
    pub account_number: Option<String>,
    /// Asset chart account this account rolls up to.
    pub chart_account_id: ChartAccountId,
    /// Current balance; always the signed sum of this account's entries.
    pub current_balance: Decimal,
    /// How far below zero the balance may go. Zero means no overdraft.
    pub overdraft_limit: Decimal,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Number of entries posted (per-account version).
    pub entry_count: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Builds a new zero-balance account.
    ///
    /// `chart_account` must be the chart account referenced by
    /// `input.chart_account_id`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty name or negative overdraft limit.
    /// - `InvalidClassification` if the chart account is not an active asset.
    pub fn new(
        input: CreateAccountInput,
        chart_account: &ChartOfAccount,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "account name cannot be empty".to_string(),
            ));
        }
        if input.overdraft_limit < Decimal::ZERO {
            return Err(LedgerError::InvalidInput(
                "overdraft limit cannot be negative".to_string(),
            ));
        }
        if chart_account.account_type != ChartAccountType::Asset || !chart_account.is_active() {
            return Err(LedgerError::InvalidClassification {
                chart_account_id: chart_account.id,
                reason: "money accounts must roll up to an active asset account".to_string(),
            });
        }

        Ok(Self {
            id: AccountId::new(),
            name: name.to_string(),
            account_type: input.account_type,
            account_number: input
                .account_number
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            chart_account_id: chart_account.id,
            current_balance: Decimal::ZERO,
            overdraft_limit: input.overdraft_limit,
            status: AccountStatus::Active,
            entry_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if the account accepts postings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Balance plus overdraft allowance.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.current_balance + self.overdraft_limit
    }

    /// Applies a freshly built entry to the balance.
    ///
    /// This is the only place `current_balance` changes.
    ///
    /// # Errors
    ///
    /// Returns `ChainBroken` if the entry does not start where the balance
    /// currently stands or does not belong to this account.
    pub fn apply_entry(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        if entry.account_id != self.id || entry.balance_before != self.current_balance {
            return Err(LedgerError::ChainBroken {
                account_id: self.id,
                sequence: entry.sequence,
                expected: self.current_balance,
                actual: entry.balance_before,
            });
        }
        let expected_after = entry.balance_before + entry.signed_amount();
        if entry.balance_after != expected_after {
            return Err(LedgerError::ChainBroken {
                account_id: self.id,
                sequence: entry.sequence,
                expected: expected_after,
                actual: entry.balance_after,
            });
        }
        self.current_balance = entry.balance_after;
        self.entry_count += 1;
        self.updated_at = entry.created_at;
        Ok(())
    }

    /// Soft-deletes the account.
    ///
    /// # Errors
    ///
    /// - `NonZeroBalance` while money remains on the account.
    /// - `InvalidStatusTransition` if already inactive.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !self.is_active() {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: AccountStatus::Inactive.to_string(),
            });
        }
        if !self.current_balance.is_zero() {
            return Err(LedgerError::NonZeroBalance {
                account_id: self.id,
                balance: self.current_balance,
            });
        }
        self.status = AccountStatus::Inactive;
        self.updated_at = now;
        Ok(())
    }

    /// Brings an inactive account back into use.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` if already active.
    pub fn reactivate(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.is_active() {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: AccountStatus::Active.to_string(),
            });
        }
        self.status = AccountStatus::Active;
        self.updated_at = now;
        Ok(())
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountInput {
    /// Display name.
    pub name: String,
    /// Kind of account.
    pub account_type: AccountType,
    /// Bank or wallet number.
    #[serde(default)]
    pub account_number: Option<String>,
    /// Asset chart account the account rolls up to.
    pub chart_account_id: ChartAccountId,
    /// Allowed overdraft; zero disables overdraft.
    #[serde(default)]
    pub overdraft_limit: Decimal,
}

/// An account together with its most recent entries (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountWithEntries {
    /// The account.
    pub account: Account,
    /// Recent entries, newest first.
    pub recent_entries: Vec<LedgerEntry>,
}
