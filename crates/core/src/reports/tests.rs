//! Property-based tests for reports module.

use chrono::{Duration, NaiveDate, Utc};
use hisab_shared::types::FiscalYearId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ReportError;
use super::service::ReportService;
use crate::account::{Account, AccountType, CreateAccountInput};
use crate::chart::{ChartAccountType, ChartOfAccount, CreateChartAccountInput};
use crate::ledger::{
    DepositInput, LedgerEntry, LedgerService, PostingStamp, TransferInput, WithdrawInput,
};

struct Books {
    chart: Vec<ChartOfAccount>,
    accounts: Vec<Account>,
    entries: Vec<LedgerEntry>,
    sequence: u64,
}

#[derive(Debug, Clone)]
enum Op {
    Deposit { account: usize, cents: i64, day: i64 },
    Withdraw { account: usize, cents: i64, day: i64 },
    Transfer { from: usize, to: usize, cents: i64, day: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1i64..500_000, 0i64..60)
            .prop_map(|(account, cents, day)| Op::Deposit { account, cents, day }),
        (0usize..3, 1i64..500_000, 0i64..60)
            .prop_map(|(account, cents, day)| Op::Withdraw { account, cents, day }),
        (0usize..3, 0usize..3, 1i64..500_000, 0i64..60)
            .prop_map(|(from, to, cents, day)| Op::Transfer { from, to, cents, day }),
    ]
}

fn chart_account(code: &str, name: &str, account_type: ChartAccountType) -> ChartOfAccount {
    ChartOfAccount::new(
        CreateChartAccountInput {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
        },
        Utc::now(),
    )
    .unwrap()
}

fn jan(day: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day)
}

impl Books {
    /// Cash (1010), Bank (1020), Owner Capital (3900), Sales (4000),
    /// Office Supplies (5100); accounts: Cash Box, Bank Main, bKash wallet.
    fn new() -> Self {
        let cash = chart_account("1010", "Cash", ChartAccountType::Asset);
        let bank = chart_account("1020", "Bank", ChartAccountType::Asset);
        let chart = vec![
            cash.clone(),
            bank.clone(),
            chart_account("3900", "Owner Capital", ChartAccountType::Equity),
            chart_account("4000", "Sales", ChartAccountType::Income),
            chart_account("5100", "Office Supplies", ChartAccountType::Expense),
        ];
        let account = |name: &str, account_type, asset: &ChartOfAccount| {
            Account::new(
                CreateAccountInput {
                    name: name.to_string(),
                    account_type,
                    account_number: None,
                    chart_account_id: asset.id,
                    overdraft_limit: Decimal::ZERO,
                },
                asset,
                Utc::now(),
            )
            .unwrap()
        };
        let accounts = vec![
            account("Cash Box", AccountType::Cash, &cash),
            account("Bank Main", AccountType::Bank, &bank),
            account("bKash", AccountType::Bkash, &bank),
        ];
        Self {
            chart,
            accounts,
            entries: Vec::new(),
            sequence: 0,
        }
    }

    fn chart(&self, code: &str) -> &ChartOfAccount {
        self.chart.iter().find(|c| c.code == code).unwrap()
    }

    fn stamp(&mut self, legs: u64) -> PostingStamp {
        let stamp = PostingStamp {
            sequence: self.sequence + 1,
            fiscal_year_id: FiscalYearId::new(),
            created_at: Utc::now(),
        };
        self.sequence += legs;
        stamp
    }

    fn deposit(&mut self, index: usize, amount: Decimal, date: NaiveDate, code: &str) {
        let classification = self.chart(code).clone();
        let input = DepositInput {
            account_id: self.accounts[index].id,
            amount,
            transaction_date: date,
            description: None,
            chart_account_id: Some(classification.id),
            idempotency_key: None,
        };
        let stamp = self.stamp(1);
        let entry =
            LedgerService::build_deposit(&self.accounts[index], &classification, &input, 2, stamp)
                .unwrap();
        self.accounts[index].apply_entry(&entry).unwrap();
        self.entries.push(entry);
    }

    fn withdraw(&mut self, index: usize, amount: Decimal, date: NaiveDate) -> bool {
        let expense = self.chart("5100").clone();
        let input = WithdrawInput {
            account_id: self.accounts[index].id,
            amount,
            transaction_date: date,
            chart_account_id: expense.id,
            description: None,
            cost_center_id: None,
            tax_percent: None,
            idempotency_key: None,
        };
        let stamp = self.stamp(1);
        match LedgerService::build_withdrawal(&self.accounts[index], &expense, &input, 2, stamp) {
            Ok(entry) => {
                self.accounts[index].apply_entry(&entry).unwrap();
                self.entries.push(entry);
                true
            }
            Err(_) => false,
        }
    }

    fn transfer(&mut self, from: usize, to: usize, amount: Decimal, date: NaiveDate) -> bool {
        let input = TransferInput {
            from_account_id: self.accounts[from].id,
            to_account_id: self.accounts[to].id,
            amount,
            transaction_date: date,
            description: None,
            idempotency_key: None,
        };
        let stamp = self.stamp(2);
        let (source, destination) = (&self.accounts[from], &self.accounts[to]);
        let built = LedgerService::build_transfer(source, destination, &input, 2, stamp);
        match built {
            Ok(result) => {
                self.accounts[from].apply_entry(&result.out_entry).unwrap();
                self.accounts[to].apply_entry(&result.in_entry).unwrap();
                self.entries.push(result.out_entry);
                self.entries.push(result.in_entry);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Deposit { account, cents, day } => {
                let code = if cents % 2 == 0 { "4000" } else { "3900" };
                self.deposit(account, Decimal::new(cents, 2), jan(day), code);
            }
            Op::Withdraw { account, cents, day } => {
                self.withdraw(account, Decimal::new(cents, 2), jan(day));
            }
            Op::Transfer { from, to, cents, day } => {
                self.transfer(from, to, Decimal::new(cents, 2), jan(day));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// **Property: Trial Balance Debits Equal Credits**
    ///
    /// *For any* sequence of postings and any as-of date, total debits SHALL
    /// equal total credits, with or without zero-balance lines.
    #[test]
    fn prop_trial_balance_always_balances(
        ops in prop::collection::vec(op_strategy(), 1..40),
        as_of_day in 0i64..70,
        include_zero in any::<bool>(),
    ) {
        let mut books = Books::new();
        for op in &ops {
            books.apply(op);
        }

        let report =
            ReportService::trial_balance(&books.chart, &books.entries, jan(as_of_day), include_zero)
                .unwrap();
        prop_assert!(report.is_balanced);
        prop_assert_eq!(report.difference, Decimal::ZERO);
        prop_assert_eq!(report.total_debit, report.total_credit);
        if include_zero {
            prop_assert_eq!(report.lines.len(), books.chart.len());
        } else {
            prop_assert!(report.lines.iter().all(|line| !line.balance.is_zero()));
        }
    }

    /// **Property: Asset balances reconcile with money accounts**
    ///
    /// *For any* sequence of postings, every asset chart account's journal
    /// balance SHALL equal the sum of its money accounts' balances.
    #[test]
    fn prop_reconciliation_holds(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut books = Books::new();
        for op in &ops {
            books.apply(op);
        }
        let report =
        ReportService::reconcile(&books.chart, &books.accounts, &books.entries, Utc::now())
            .unwrap();
        prop_assert!(report.is_reconciled);
        prop_assert_eq!(report.total_ledger_balance, report.total_accounts_balance);
    }
}

#[test]
fn test_example_scenario_trial_balance() {
    let mut books = Books::new();
    books.deposit(0, dec!(1000.00), jan(4), "3900");
    assert!(books.withdraw(0, dec!(300.00), jan(5)));
    assert!(books.transfer(0, 1, dec!(200.00), jan(6)));

    assert_eq!(books.accounts[0].current_balance, dec!(500.00));
    assert_eq!(books.accounts[1].current_balance, dec!(200.00));

    let report = ReportService::trial_balance(&books.chart, &books.entries, jan(6), false).unwrap();
    assert!(report.is_balanced);
    assert_eq!(report.total_debit, dec!(1500.00));

    let codes: Vec<&str> = report.lines.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["1010", "1020", "3900", "5100"]);

    let cash = &report.lines[0];
    assert_eq!(cash.debit, dec!(1000.00));
    assert_eq!(cash.credit, dec!(500.00));
    assert_eq!(cash.balance, dec!(500.00));
    let capital = &report.lines[2];
    assert_eq!(capital.balance, dec!(1000.00));
    assert_eq!(report.lines[3].balance, dec!(300.00));
}

#[test]
fn test_as_of_excludes_later_entries() {
    let mut books = Books::new();
    books.deposit(0, dec!(1000.00), jan(4), "4000");
    books.deposit(0, dec!(50.00), jan(20), "4000");

    let report = ReportService::trial_balance(&books.chart, &books.entries, jan(10), true).unwrap();
    let sales = report.lines.iter().find(|l| l.code == "4000").unwrap();
    assert_eq!(sales.credit, dec!(1000.00));
    assert_eq!(sales.balance, dec!(1000.00));
}

#[test]
fn test_empty_ledger_is_balanced() {
    let books = Books::new();
    let report = ReportService::trial_balance(&books.chart, &books.entries, jan(0), false).unwrap();
    assert!(report.lines.is_empty());
    assert!(report.is_balanced);
}

#[test]
fn test_unknown_chart_account_is_reported() {
    let mut books = Books::new();
    books.deposit(0, dec!(10.00), jan(1), "4000");
    let missing = books.chart.remove(3).id;
    let result = ReportService::trial_balance(&books.chart, &books.entries, jan(1), true);
    assert_eq!(result, Err(ReportError::AccountNotFound(missing)));
}

#[test]
fn test_reconcile_detects_drift() {
    let mut books = Books::new();
    books.deposit(0, dec!(100.00), jan(1), "3900");
    books.accounts[0].current_balance = dec!(90.00);

    let report =
        ReportService::reconcile(&books.chart, &books.accounts, &books.entries, Utc::now())
            .unwrap();
    assert!(!report.is_reconciled);
    assert_eq!(report.account_mismatches.len(), 1);
    assert_eq!(report.account_mismatches[0].ledger_balance, dec!(100.00));
    let cash = report.lines.iter().find(|l| l.code == "1010").unwrap();
    assert_eq!(cash.difference, dec!(10.00));
}

#[test]
fn test_reconcile_rejects_account_outside_asset_lines() {
    let mut books = Books::new();
    books.chart[1].account_type = ChartAccountType::Expense;
    books.deposit(1, dec!(200.00), jan(1), "4000");

    let report =
        ReportService::reconcile(&books.chart, &books.accounts, &books.entries, Utc::now())
            .unwrap();
    assert!(!report.is_reconciled);
    assert!(report.account_mismatches.is_empty());
    assert_eq!(report.unlinked_accounts, vec![books.accounts[1].id]);
    assert_eq!(report.total_accounts_balance, dec!(200.00));
    assert_eq!(report.total_ledger_balance, Decimal::ZERO);
    assert!(report.lines.iter().all(|line| line.difference.is_zero()));
}
