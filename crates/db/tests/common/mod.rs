//! Shared fixture for the storage integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use hisab_core::account::{Account, AccountType, CreateAccountInput};
use hisab_core::chart::{ChartAccountType, ChartOfAccount, CreateChartAccountInput};
use hisab_core::fiscal::{CreateFiscalYearInput, FiscalYear};
use hisab_core::ledger::{DepositInput, LedgerEntry, TransferInput, WithdrawInput};
use hisab_db::{
    AccountRepository, BudgetRepository, ChartRepository, CommitLog, Database, FiscalRepository,
    LedgerRepository, ReportRepository,
};
use hisab_shared::AppConfig;
use hisab_shared::types::{AccountId, ChartAccountId};
use rust_decimal::Decimal;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A store with FY2025, a small chart, and two money accounts.
pub struct Fixture {
    pub db: Database,
    pub accounts: AccountRepository,
    pub chart: ChartRepository,
    pub ledger: LedgerRepository,
    pub fiscal: FiscalRepository,
    pub budgets: BudgetRepository,
    pub reports: ReportRepository,
    pub fy2025: FiscalYear,
    pub cash_chart: ChartOfAccount,
    pub bank_chart: ChartOfAccount,
    pub opening_equity: ChartOfAccount,
    pub sales: ChartOfAccount,
    pub office_supplies: ChartOfAccount,
    pub travel: ChartOfAccount,
    pub cash_box: Account,
    pub bank_main: Account,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_database(Database::new(AppConfig::default())).await
    }

    pub async fn with_commit_log(commit_log: Arc<dyn CommitLog>) -> Self {
        Self::with_database(Database::with_commit_log(AppConfig::default(), commit_log)).await
    }

    pub async fn with_database(db: Database) -> Self {
        let accounts = AccountRepository::new(db.clone());
        let chart = ChartRepository::new(db.clone());
        let ledger = LedgerRepository::new(db.clone());
        let fiscal = FiscalRepository::new(db.clone());
        let budgets = BudgetRepository::new(db.clone());
        let reports = ReportRepository::new(db.clone());

        let fy2025 = fiscal
            .create(CreateFiscalYearInput {
                name: "FY2025".to_string(),
                start_date: date(2025, 1, 1),
                end_date: date(2025, 12, 31),
            })
            .await
            .unwrap();

        let cash_chart =
            chart_account(&chart, "1010", "Cash on Hand", ChartAccountType::Asset).await;
        let bank_chart =
            chart_account(&chart, "1020", "Bank Accounts", ChartAccountType::Asset).await;
        let opening_equity =
            chart_account(&chart, "3900", "Opening Balance Equity", ChartAccountType::Equity).await;
        let sales = chart_account(&chart, "4000", "Sales", ChartAccountType::Income).await;
        let office_supplies =
            chart_account(&chart, "5100", "Office Supplies", ChartAccountType::Expense).await;
        let travel = chart_account(&chart, "5200", "Travel", ChartAccountType::Expense).await;

        let cash_box = money_account(&accounts, "Cash Box", AccountType::Cash, cash_chart.id).await;
        let bank_main =
            money_account(&accounts, "Bank Main", AccountType::Bank, bank_chart.id).await;

        Self {
            db,
            accounts,
            chart,
            ledger,
            fiscal,
            budgets,
            reports,
            fy2025,
            cash_chart,
            bank_chart,
            opening_equity,
            sales,
            office_supplies,
            travel,
            cash_box,
            bank_main,
        }
    }

    pub async fn balance(&self, id: AccountId) -> Decimal {
        self.accounts.get(id, false).unwrap().account.current_balance
    }

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        on: NaiveDate,
    ) -> LedgerEntry {
        self.ledger
            .deposit(deposit_input(account_id, amount, on))
            .await
            .unwrap()
    }

    pub async fn withdraw(
        &self,
        account_id: AccountId,
        expense: ChartAccountId,
        amount: Decimal,
        on: NaiveDate,
    ) -> LedgerEntry {
        self.ledger
            .withdraw(withdraw_input(account_id, expense, amount, on))
            .await
            .unwrap()
    }
}

pub async fn chart_account(
    chart: &ChartRepository,
    code: &str,
    name: &str,
    account_type: ChartAccountType,
) -> ChartOfAccount {
    chart
        .create(CreateChartAccountInput {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
        })
        .await
        .unwrap()
}

pub async fn money_account(
    accounts: &AccountRepository,
    name: &str,
    account_type: AccountType,
    chart_account_id: ChartAccountId,
) -> Account {
    accounts
        .create(CreateAccountInput {
            name: name.to_string(),
            account_type,
            account_number: None,
            chart_account_id,
            overdraft_limit: Decimal::ZERO,
        })
        .await
        .unwrap()
}

pub fn deposit_input(account_id: AccountId, amount: Decimal, on: NaiveDate) -> DepositInput {
    DepositInput {
        account_id,
        amount,
        transaction_date: on,
        description: None,
        chart_account_id: None,
        idempotency_key: None,
    }
}

pub fn withdraw_input(
    account_id: AccountId,
    expense: ChartAccountId,
    amount: Decimal,
    on: NaiveDate,
) -> WithdrawInput {
    WithdrawInput {
        account_id,
        amount,
        transaction_date: on,
        chart_account_id: expense,
        description: None,
        cost_center_id: None,
        tax_percent: None,
        idempotency_key: None,
    }
}

pub fn transfer_input(
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: Decimal,
    on: NaiveDate,
) -> TransferInput {
    TransferInput {
        from_account_id,
        to_account_id,
        amount,
        transaction_date: on,
        description: None,
        idempotency_key: None,
    }
}
