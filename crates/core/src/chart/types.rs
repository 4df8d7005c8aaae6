//! Chart-of-account types and classification rules.

use chrono::{DateTime, Utc};
use hisab_shared::types::ChartAccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// Maximum length of a chart account code.
pub const MAX_CODE_LEN: usize = 20;

/// Chart account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartAccountType {
    /// Things the business owns (cash, bank, receivables).
    Asset,
    /// Amounts the business owes.
    Liability,
    /// Owner's stake.
    Equity,
    /// Revenue.
    Income,
    /// Costs.
    Expense,
}

/// Side on which an account's balance normally sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Asset and expense accounts: balance = debit - credit.
    Debit,
    /// Liability, equity and income accounts: balance = credit - debit.
    Credit,
}

impl ChartAccountType {
    /// Returns the normal balance side for this type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }

    /// Returns true if deposits may be classified against this type.
    #[must_use]
    pub const fn accepts_deposits(self) -> bool {
        matches!(self, Self::Income | Self::Liability | Self::Equity)
    }
}

impl std::fmt::Display for ChartAccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        };
        f.write_str(name)
    }
}

impl NormalBalance {
    /// Balance from debit and credit totals, signed for this side.
    #[must_use]
    pub fn balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Lifecycle of a chart account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartAccountStatus {
    /// Usable for new postings.
    Active,
    /// Kept for history, rejected for new postings.
    Inactive,
}

impl std::fmt::Display for ChartAccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// How much other records depend on a chart account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartUsage {
    /// Nothing links to or posts against it.
    Unused,
    /// A money account rolls up to it or a budget is scoped to it. The
    /// classification is fixed; the name may still change.
    Linked,
    /// A posted entry references it. The record is immutable.
    Posted,
}

/// A chart-of-accounts entry used to classify postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccount {
    /// Unique identifier.
    pub id: ChartAccountId,
    /// Unique, sortable code (e.g. "5100").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: ChartAccountType,
    /// Lifecycle status.
    pub status: ChartAccountStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ChartOfAccount {
    /// Builds a new active chart account from validated input.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidInput` for an empty name or malformed code.
    pub fn new(input: CreateChartAccountInput, now: DateTime<Utc>) -> Result<Self, LedgerError> {
        validate_code(&input.code)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "chart account name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: ChartAccountId::new(),
            code: input.code.trim().to_string(),
            name: name.to_string(),
            account_type: input.account_type,
            status: ChartAccountStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if this account can receive new postings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ChartAccountStatus::Active
    }

    /// Returns the normal balance side.
    #[must_use]
    pub fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }

    /// Applies an update allowed by `usage`.
    ///
    /// # Errors
    ///
    /// Returns `ChartAccountInUse` once posted against, or for a type change
    /// while linked; `InvalidInput` for an empty name.
    pub fn apply_update(
        &mut self,
        update: UpdateChartAccountInput,
        usage: ChartUsage,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let reclassifies = update
            .account_type
            .is_some_and(|account_type| account_type != self.account_type);
        match usage {
            ChartUsage::Posted => return Err(LedgerError::ChartAccountInUse(self.id)),
            ChartUsage::Linked if reclassifies => {
                return Err(LedgerError::ChartAccountInUse(self.id));
            }
            ChartUsage::Linked | ChartUsage::Unused => {}
        }
        let name = match update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(LedgerError::InvalidInput(
                    "chart account name cannot be empty".to_string(),
                ));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(account_type) = update.account_type {
            self.account_type = account_type;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Moves the account to `status`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` if already in that status.
    pub fn transition_to(
        &mut self,
        status: ChartAccountStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.status == status {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}

/// Input for creating a chart account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChartAccountInput {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: ChartAccountType,
}

/// Input for updating a chart account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChartAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New classification.
    pub account_type: Option<ChartAccountType>,
}

/// Validates a chart account code: 1 to 20 ASCII alphanumerics, dots or dashes.
///
/// # Errors
///
/// Returns `LedgerError::InvalidInput` for a malformed code.
pub fn validate_code(code: &str) -> Result<(), LedgerError> {
    let code = code.trim();
    let well_formed = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if well_formed {
        Ok(())
    } else {
        Err(LedgerError::InvalidInput(format!(
            "invalid chart account code: {code:?}"
        )))
    }
}
