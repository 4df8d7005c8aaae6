//! Ledger service for posting validation and entry construction.
//!
//! This module provides the core business logic for turning a posting
//! request into immutable ledger entries before they are committed.

use chrono::{DateTime, Utc};
use hisab_shared::types::money::apply_percentage;
use hisab_shared::types::{FiscalYearId, LedgerEntryId};
use rust_decimal::Decimal;

use super::balance::RunningBalance;
use super::entry::{EntryType, JournalLine, LedgerEntry};
use super::error::LedgerError;
use super::types::{DepositInput, TransferInput, TransferResult, WithdrawInput};
use super::validation::{
    ensure_active, ensure_sufficient_balance, validate_amount, validate_deposit_classification,
    validate_expense_classification, validate_journal, validate_tax_percent,
};
use crate::account::Account;
use crate::chart::ChartOfAccount;

/// Commit-time facts the store assigns to a posting.
#[derive(Debug, Clone, Copy)]
pub struct PostingStamp {
    /// Sequence of the first entry; a transfer uses this and the next one.
    pub sequence: u64,
    /// Fiscal year the posting date resolved to.
    pub fiscal_year_id: FiscalYearId,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// Ledger service for posting validation and entry construction.
///
/// This service contains pure business logic with no storage dependencies.
/// Callers hold the account locks; the service only reads the accounts it is
/// given and never mutates them.
pub struct LedgerService;

impl LedgerService {
    /// Validates a deposit and builds its entry.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive or over-precise amount
    /// - `AccountInactive` if the account is inactive
    /// - `InvalidClassification` if `classification` cannot take deposits
    pub fn build_deposit(
        account: &Account,
        classification: &ChartOfAccount,
        input: &DepositInput,
        amount_scale: u32,
        stamp: PostingStamp,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(input.amount, amount_scale)?;
        ensure_active(account)?;
        validate_deposit_classification(classification)?;

        let running = RunningBalance::continue_from(
            account.entry_count,
            account.current_balance,
            input.amount,
        );
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: stamp.sequence,
            account_id: account.id,
            account_chart_id: account.chart_account_id,
            chart_account_id: Some(classification.id),
            entry_type: EntryType::Deposit,
            amount: input.amount,
            tax_amount: Decimal::ZERO,
            balance_before: running.balance_before,
            balance_after: running.balance_after,
            description: normalize_description(input.description.as_deref()),
            transaction_date: input.transaction_date,
            created_at: stamp.created_at,
            counterparty_account_id: None,
            fiscal_year_id: stamp.fiscal_year_id,
            cost_center_id: None,
            idempotency_key: input.idempotency_key.clone(),
        };

        validate_journal(&entry.journal_lines())?;
        Ok(entry)
    }

    /// Validates a withdrawal and builds its entry.
    ///
    /// The posted amount includes tax when `tax_percent` is given.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive or over-precise amount
    /// - `InvalidInput` for a tax percentage outside 0..=100
    /// - `AccountInactive` if the account is inactive
    /// - `InvalidClassification` if `expense` is not an active expense account
    /// - `InsufficientBalance` if the total exceeds balance plus overdraft
    pub fn build_withdrawal(
        account: &Account,
        expense: &ChartOfAccount,
        input: &WithdrawInput,
        amount_scale: u32,
        stamp: PostingStamp,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(input.amount, amount_scale)?;
        let (total, tax_amount) =
            Self::withdrawal_total(input.amount, input.tax_percent, amount_scale)?;
        ensure_active(account)?;
        validate_expense_classification(expense)?;
        ensure_sufficient_balance(account, total)?;

        let running =
            RunningBalance::continue_from(account.entry_count, account.current_balance, -total);
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: stamp.sequence,
            account_id: account.id,
            account_chart_id: account.chart_account_id,
            chart_account_id: Some(expense.id),
            entry_type: EntryType::Withdrawal,
            amount: total,
            tax_amount,
            balance_before: running.balance_before,
            balance_after: running.balance_after,
            description: normalize_description(input.description.as_deref()),
            transaction_date: input.transaction_date,
            created_at: stamp.created_at,
            counterparty_account_id: None,
            fiscal_year_id: stamp.fiscal_year_id,
            cost_center_id: input.cost_center_id,
            idempotency_key: input.idempotency_key.clone(),
        };

        validate_journal(&entry.journal_lines())?;
        Ok(entry)
    }

    /// Validates a transfer and builds both legs.
    ///
    /// The `transfer_out` leg takes `stamp.sequence`, the `transfer_in` leg
    /// the next sequence. Each leg names the other account as counterparty.
    ///
    /// # Errors
    ///
    /// - `SameAccount` if source and destination are the same
    /// - `InvalidAmount` for a non-positive or over-precise amount
    /// - `AccountInactive` if either account is inactive
    /// - `InsufficientBalance` if the source cannot cover the amount
    pub fn build_transfer(
        from: &Account,
        to: &Account,
        input: &TransferInput,
        amount_scale: u32,
        stamp: PostingStamp,
    ) -> Result<TransferResult, LedgerError> {
        Self::precheck_transfer(input, amount_scale)?;
        ensure_active(from)?;
        ensure_active(to)?;
        ensure_sufficient_balance(from, input.amount)?;

        let description = normalize_description(input.description.as_deref());
        let out_running =
            RunningBalance::continue_from(from.entry_count, from.current_balance, -input.amount);
        let in_running =
            RunningBalance::continue_from(to.entry_count, to.current_balance, input.amount);

        let leg = |account: &Account,
                   counterparty: &Account,
                   entry_type: EntryType,
                   running: RunningBalance,
                   sequence: u64| LedgerEntry {
            id: LedgerEntryId::new(),
            sequence,
            account_id: account.id,
            account_chart_id: account.chart_account_id,
            chart_account_id: None,
            entry_type,
            amount: input.amount,
            tax_amount: Decimal::ZERO,
            balance_before: running.balance_before,
            balance_after: running.balance_after,
            description: description.clone(),
            transaction_date: input.transaction_date,
            created_at: stamp.created_at,
            counterparty_account_id: Some(counterparty.id),
            fiscal_year_id: stamp.fiscal_year_id,
            cost_center_id: None,
            idempotency_key: input.idempotency_key.clone(),
        };

        let result = TransferResult {
            out_entry: leg(from, to, EntryType::TransferOut, out_running, stamp.sequence),
            in_entry: leg(to, from, EntryType::TransferIn, in_running, stamp.sequence + 1),
        };

        let lines: Vec<JournalLine> = result
            .entries()
            .iter()
            .flat_map(|entry| entry.journal_lines())
            .collect();
        validate_journal(&lines)?;
        Ok(result)
    }

    /// Checks the parts of a transfer that need no account state.
    ///
    /// # Errors
    ///
    /// `SameAccount` or `InvalidAmount`.
    pub fn precheck_transfer(input: &TransferInput, amount_scale: u32) -> Result<(), LedgerError> {
        if input.from_account_id == input.to_account_id {
            return Err(LedgerError::SameAccount);
        }
        validate_amount(input.amount, amount_scale)
    }

    /// Total amount and tax portion of a withdrawal.
    ///
    /// Tax is rounded to `amount_scale` with banker's rounding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a tax percentage outside 0..=100.
    pub fn withdrawal_total(
        amount: Decimal,
        tax_percent: Option<Decimal>,
        amount_scale: u32,
    ) -> Result<(Decimal, Decimal), LedgerError> {
        let tax = match tax_percent {
            Some(percent) => {
                validate_tax_percent(percent)?;
                apply_percentage(amount, percent, amount_scale)
            }
            None => Decimal::ZERO,
        };
        Ok((amount + tax, tax))
    }
}

fn normalize_description(description: Option<&str>) -> String {
    description.map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountType, CreateAccountInput};
    use crate::chart::{ChartAccountType, CreateChartAccountInput};
    use chrono::NaiveDate;
    use hisab_shared::types::{AccountId, CostCenterId};
    use rust_decimal_macros::dec;

    fn chart(code: &str, account_type: ChartAccountType) -> ChartOfAccount {
        ChartOfAccount::new(
            CreateChartAccountInput {
                code: code.to_string(),
                name: code.to_string(),
                account_type,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn account(name: &str, asset: &ChartOfAccount) -> Account {
        Account::new(
            CreateAccountInput {
                name: name.to_string(),
                account_type: AccountType::Cash,
                account_number: None,
                chart_account_id: asset.id,
                overdraft_limit: Decimal::ZERO,
            },
            asset,
            Utc::now(),
        )
        .unwrap()
    }

    fn stamp(sequence: u64) -> PostingStamp {
        PostingStamp {
            sequence,
            fiscal_year_id: FiscalYearId::new(),
            created_at: Utc::now(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn deposit(account: &Account, amount: Decimal) -> DepositInput {
        DepositInput {
            account_id: account.id,
            amount,
            transaction_date: date(5),
            description: Some("  Opening float ".to_string()),
            chart_account_id: None,
            idempotency_key: None,
        }
    }

    fn withdraw(account: &Account, expense: &ChartOfAccount, amount: Decimal) -> WithdrawInput {
        WithdrawInput {
            account_id: account.id,
            amount,
            transaction_date: date(6),
            chart_account_id: expense.id,
            description: None,
            cost_center_id: None,
            tax_percent: None,
            idempotency_key: None,
        }
    }

    fn transfer(from: &Account, to: &Account, amount: Decimal) -> TransferInput {
        TransferInput {
            from_account_id: from.id,
            to_account_id: to.id,
            amount,
            transaction_date: date(7),
            description: None,
            idempotency_key: None,
        }
    }

    fn funded(amount: Decimal) -> (Account, ChartOfAccount) {
        let asset = chart("1010", ChartAccountType::Asset);
        let equity = chart("3900", ChartAccountType::Equity);
        let mut cash = account("Cash Box", &asset);
        let entry =
            LedgerService::build_deposit(&cash, &equity, &deposit(&cash, amount), 2, stamp(1))
                .unwrap();
        cash.apply_entry(&entry).unwrap();
        (cash, asset)
    }

    #[test]
    fn test_deposit_builds_chain_entry() {
        let asset = chart("1010", ChartAccountType::Asset);
        let equity = chart("3900", ChartAccountType::Equity);
        let cash = account("Cash Box", &asset);

        let input = deposit(&cash, dec!(1000.00));
        let entry = LedgerService::build_deposit(&cash, &equity, &input, 2, stamp(7)).unwrap();

        assert_eq!(entry.entry_type, EntryType::Deposit);
        assert_eq!(entry.sequence, 7);
        assert_eq!(entry.balance_before, dec!(0));
        assert_eq!(entry.balance_after, dec!(1000.00));
        assert_eq!(entry.chart_account_id, Some(equity.id));
        assert_eq!(entry.account_chart_id, asset.id);
        assert_eq!(entry.description, "Opening float");
    }

    #[test]
    fn test_deposit_rejects_expense_classification() {
        let asset = chart("1010", ChartAccountType::Asset);
        let expense = chart("5100", ChartAccountType::Expense);
        let cash = account("Cash Box", &asset);
        let result =
            LedgerService::build_deposit(&cash, &expense, &deposit(&cash, dec!(10)), 2, stamp(1));
        assert!(matches!(
            result,
            Err(LedgerError::InvalidClassification { .. })
        ));
    }

    #[test]
    fn test_deposit_rejects_zero_amount() {
        let asset = chart("1010", ChartAccountType::Asset);
        let income = chart("4000", ChartAccountType::Income);
        let cash = account("Cash Box", &asset);
        let result =
            LedgerService::build_deposit(&cash, &income, &deposit(&cash, dec!(0)), 2, stamp(1));
        assert_eq!(result, Err(LedgerError::InvalidAmount(dec!(0))));
    }

    #[test]
    fn test_withdrawal_reduces_balance() {
        let (cash, _) = funded(dec!(1000.00));
        let supplies = chart("5100", ChartAccountType::Expense);

        let entry = LedgerService::build_withdrawal(
            &cash,
            &supplies,
            &withdraw(&cash, &supplies, dec!(300.00)),
            2,
            stamp(2),
        )
        .unwrap();

        assert_eq!(entry.balance_before, dec!(1000.00));
        assert_eq!(entry.balance_after, dec!(700.00));
        assert!(entry.is_expense());
    }

    #[test]
    fn test_withdrawal_with_tax_posts_gross_amount() {
        let (cash, _) = funded(dec!(1000.00));
        let supplies = chart("5100", ChartAccountType::Expense);
        let mut input = withdraw(&cash, &supplies, dec!(200.00));
        input.tax_percent = Some(dec!(15));
        input.cost_center_id = Some(CostCenterId::new());

        let entry =
            LedgerService::build_withdrawal(&cash, &supplies, &input, 2, stamp(2)).unwrap();

        assert_eq!(entry.amount, dec!(230.00));
        assert_eq!(entry.tax_amount, dec!(30.00));
        assert_eq!(entry.balance_after, dec!(770.00));
        assert_eq!(entry.cost_center_id, input.cost_center_id);
    }

    #[test]
    fn test_withdrawal_insufficient_balance() {
        let (cash, _) = funded(dec!(100.00));
        let supplies = chart("5100", ChartAccountType::Expense);
        let result = LedgerService::build_withdrawal(
            &cash,
            &supplies,
            &withdraw(&cash, &supplies, dec!(100.01)),
            2,
            stamp(2),
        );
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_tax_uses_bankers_rounding() {
        // 0.125 rounds to 0.12 under MidpointNearestEven
        let (total, tax) =
            LedgerService::withdrawal_total(dec!(1.25), Some(dec!(10)), 2).unwrap();
        assert_eq!(tax, dec!(0.12));
        assert_eq!(total, dec!(1.37));
    }

    #[test]
    fn test_transfer_builds_linked_pair() {
        let (cash, asset) = funded(dec!(700.00));
        let bank = account("Bank Main", &asset);

        let input = transfer(&cash, &bank, dec!(200.00));
        let result = LedgerService::build_transfer(&cash, &bank, &input, 2, stamp(10)).unwrap();

        assert_eq!(result.out_entry.entry_type, EntryType::TransferOut);
        assert_eq!(result.out_entry.balance_after, dec!(500.00));
        assert_eq!(result.out_entry.counterparty_account_id, Some(bank.id));
        assert_eq!(result.out_entry.sequence, 10);

        assert_eq!(result.in_entry.entry_type, EntryType::TransferIn);
        assert_eq!(result.in_entry.balance_after, dec!(200.00));
        assert_eq!(result.in_entry.counterparty_account_id, Some(cash.id));
        assert_eq!(result.in_entry.sequence, 11);
    }

    #[test]
    fn test_transfer_same_account_rejected() {
        let (cash, _) = funded(dec!(700.00));
        let input = transfer(&cash, &cash, dec!(1));
        assert_eq!(
            LedgerService::build_transfer(&cash, &cash, &input, 2, stamp(1)),
            Err(LedgerError::SameAccount)
        );
    }

    #[test]
    fn test_transfer_to_inactive_account_rejected() {
        let (cash, asset) = funded(dec!(700.00));
        let mut bank = account("Bank Main", &asset);
        bank.deactivate(Utc::now()).unwrap();
        let input = transfer(&cash, &bank, dec!(1));
        let result = LedgerService::build_transfer(&cash, &bank, &input, 2, stamp(1));
        assert_eq!(result, Err(LedgerError::AccountInactive(bank.id)));
    }

    #[test]
    fn test_precheck_needs_no_accounts() {
        let input = TransferInput {
            from_account_id: AccountId::new(),
            to_account_id: AccountId::new(),
            amount: dec!(-3),
            transaction_date: date(7),
            description: None,
            idempotency_key: None,
        };
        assert_eq!(
            LedgerService::precheck_transfer(&input, 2),
            Err(LedgerError::InvalidAmount(dec!(-3)))
        );
    }
}
