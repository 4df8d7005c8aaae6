//! Property-based tests for LedgerService.
//!
//! - Balance conservation across transfers
//! - No withdrawal or transfer breaches the overdraft limit
//! - Every built posting is double-entry balanced

use chrono::{NaiveDate, Utc};
use hisab_shared::types::FiscalYearId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{EntryType, JournalLine, LedgerEntry};
use super::error::LedgerError;
use super::service::{LedgerService, PostingStamp};
use super::types::{DepositInput, TransferInput, WithdrawInput};
use super::validation::validate_journal;
use crate::account::{Account, AccountType, CreateAccountInput};
use crate::chart::{ChartAccountType, ChartOfAccount, CreateChartAccountInput};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// One posting against a single account.
#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        positive_amount().prop_map(Op::Deposit),
        positive_amount().prop_map(Op::Withdraw),
    ]
}

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

fn account(asset: &ChartOfAccount, overdraft_limit: Decimal) -> Account {
    Account::new(
        CreateAccountInput {
            name: "Account".to_string(),
            account_type: AccountType::Bank,
            account_number: None,
            chart_account_id: asset.id,
            overdraft_limit,
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

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn deposit_into(account: &mut Account, equity: &ChartOfAccount, amount: Decimal, sequence: u64) {
    let input = DepositInput {
        account_id: account.id,
        amount,
        transaction_date: today(),
        description: None,
        chart_account_id: None,
        idempotency_key: None,
    };
    let entry = LedgerService::build_deposit(account, equity, &input, 2, stamp(sequence)).unwrap();
    account.apply_entry(&entry).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property: Transfer conserves money**
    ///
    /// *For any* funded source and transfer amount, the sum of both balances
    /// SHALL be unchanged after the transfer is applied.
    #[test]
    fn prop_transfer_conserves_money(
        funding in positive_amount(),
        amount in positive_amount(),
    ) {
        prop_assume!(amount <= funding);
        let asset = chart("1010", ChartAccountType::Asset);
        let equity = chart("3900", ChartAccountType::Equity);
        let mut from = account(&asset, Decimal::ZERO);
        let mut to = account(&asset, Decimal::ZERO);
        deposit_into(&mut from, &equity, funding, 1);

        let total_before = from.current_balance + to.current_balance;
        let input = TransferInput {
            from_account_id: from.id,
            to_account_id: to.id,
            amount,
            transaction_date: today(),
            description: None,
            idempotency_key: None,
        };
        let result = LedgerService::build_transfer(&from, &to, &input, 2, stamp(2)).unwrap();
        from.apply_entry(&result.out_entry).unwrap();
        to.apply_entry(&result.in_entry).unwrap();

        prop_assert_eq!(from.current_balance + to.current_balance, total_before);
        prop_assert_eq!(to.current_balance, amount);
    }

    /// **Property: Balance never drops below the overdraft limit**
    ///
    /// *For any* sequence of deposits and withdrawals, a withdrawal SHALL be
    /// accepted exactly when it keeps `balance >= -overdraft_limit`, and the
    /// balance SHALL equal the signed sum of accepted entries.
    #[test]
    fn prop_overdraft_limit_holds(
        overdraft_cents in 0i64..50_000,
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let overdraft = Decimal::new(overdraft_cents, 2);
        let asset = chart("1010", ChartAccountType::Asset);
        let equity = chart("3900", ChartAccountType::Equity);
        let expense = chart("5100", ChartAccountType::Expense);
        let mut acct = account(&asset, overdraft);
        let mut accepted: Vec<LedgerEntry> = Vec::new();

        for (i, op) in ops.into_iter().enumerate() {
            let sequence = i as u64 + 1;
            match op {
                Op::Deposit(amount) => {
                    let input = DepositInput {
                        account_id: acct.id,
                        amount,
                        transaction_date: today(),
                        description: None,
                        chart_account_id: None,
                        idempotency_key: None,
                    };
                    let entry =
                        LedgerService::build_deposit(&acct, &equity, &input, 2, stamp(sequence))
                            .unwrap();
                    acct.apply_entry(&entry).unwrap();
                    accepted.push(entry);
                }
                Op::Withdraw(amount) => {
                    let input = WithdrawInput {
                        account_id: acct.id,
                        amount,
                        transaction_date: today(),
                        chart_account_id: expense.id,
                        description: None,
                        cost_center_id: None,
                        tax_percent: None,
                        idempotency_key: None,
                    };
                    let fits = acct.current_balance - amount >= -overdraft;
                    let stamped = stamp(sequence);
                    let built =
                        LedgerService::build_withdrawal(&acct, &expense, &input, 2, stamped);
                    match built {
                        Ok(entry) => {
                            prop_assert!(fits);
                            acct.apply_entry(&entry).unwrap();
                            accepted.push(entry);
                        }
                        Err(LedgerError::InsufficientBalance { .. }) => prop_assert!(!fits),
                        Err(other) => prop_assert!(false, "unexpected error {other}"),
                    }
                }
            }
            prop_assert!(acct.current_balance >= -overdraft);
        }

        let signed_sum: Decimal = accepted.iter().map(LedgerEntry::signed_amount).sum();
        prop_assert_eq!(acct.current_balance, signed_sum);
    }

    /// **Property: Built postings are double-entry balanced**
    ///
    /// *For any* withdrawal with tax, the journal lines SHALL balance and
    /// the gross amount SHALL equal net plus tax.
    #[test]
    fn prop_withdrawal_journal_balances(
        amount in positive_amount(),
        tax_percent in 0i64..=100,
    ) {
        let asset = chart("1010", ChartAccountType::Asset);
        let equity = chart("3900", ChartAccountType::Equity);
        let expense = chart("5100", ChartAccountType::Expense);
        let mut acct = account(&asset, Decimal::ZERO);
        deposit_into(&mut acct, &equity, Decimal::new(100_000_000, 2), 1);

        let input = WithdrawInput {
            account_id: acct.id,
            amount,
            transaction_date: today(),
            chart_account_id: expense.id,
            description: None,
            cost_center_id: None,
            tax_percent: Some(Decimal::from(tax_percent)),
            idempotency_key: None,
        };
        let entry = LedgerService::build_withdrawal(&acct, &expense, &input, 2, stamp(2)).unwrap();

        prop_assert_eq!(entry.entry_type, EntryType::Withdrawal);
        prop_assert_eq!(entry.amount, amount + entry.tax_amount);
        let lines: Vec<JournalLine> = entry.journal_lines();
        prop_assert!(validate_journal(&lines).is_ok());
    }
}
