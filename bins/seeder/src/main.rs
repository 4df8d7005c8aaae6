//! Demo ledger seeder for Hisab development.
//!
//! Builds a small shop's books in memory (chart of accounts, FY2025, a
//! cash box and a bank account, a quarter of postings, a budget and a cost
//! center), then prints the trial balance and the reconciliation as JSON.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use hisab_core::account::{AccountType, CreateAccountInput};
use hisab_core::budget::{BudgetScope, CreateBudgetInput, CreateCostCenterInput, PeriodType};
use hisab_core::chart::{ChartAccountType, ChartOfAccount, CreateChartAccountInput};
use hisab_core::fiscal::CreateFiscalYearInput;
use hisab_core::ledger::{DepositInput, TransferInput, WithdrawInput};
use hisab_db::{
    AccountRepository, BudgetRepository, ChartRepository, Database, FiscalRepository,
    LedgerRepository, ReportRepository,
};
use hisab_shared::AppConfig;
use hisab_shared::types::IdempotencyKey;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Standard chart for a small retail business.
const CHART: &[(&str, &str, ChartAccountType)] = &[
    ("1010", "Cash on Hand", ChartAccountType::Asset),
    ("1020", "Bank Accounts", ChartAccountType::Asset),
    ("1030", "Mobile Wallets", ChartAccountType::Asset),
    ("2100", "Accounts Payable", ChartAccountType::Liability),
    ("3900", "Opening Balance Equity", ChartAccountType::Equity),
    ("4000", "Sales Revenue", ChartAccountType::Income),
    ("5100", "Office Supplies", ChartAccountType::Expense),
    ("5200", "Rent", ChartAccountType::Expense),
    ("5300", "Utilities", ChartAccountType::Expense),
];

fn date(month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, month, day).context("invalid seed date")
}

fn by_code<'a>(chart: &'a [ChartOfAccount], code: &str) -> anyhow::Result<&'a ChartOfAccount> {
    chart
        .iter()
        .find(|account| account.code == code)
        .with_context(|| format!("seed chart is missing {code}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hisab=debug,hisab_db=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = Database::new(config);
    let chart = ChartRepository::new(db.clone());
    let fiscal = FiscalRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let budgets = BudgetRepository::new(db.clone());
    let reports = ReportRepository::new(db.clone());

    info!("Seeding chart of accounts");
    let mut chart_accounts = Vec::with_capacity(CHART.len());
    for &(code, name, account_type) in CHART {
        chart_accounts.push(
            chart
                .create(CreateChartAccountInput {
                    code: code.to_string(),
                    name: name.to_string(),
                    account_type,
                })
                .await?,
        );
    }
    let supplies = by_code(&chart_accounts, "5100")?;
    let rent = by_code(&chart_accounts, "5200")?;
    let utilities = by_code(&chart_accounts, "5300")?;
    let sales = by_code(&chart_accounts, "4000")?;

    info!("Seeding fiscal year");
    let fy2025 = fiscal
        .create(CreateFiscalYearInput {
            name: "FY2025".to_string(),
            start_date: date(1, 1)?,
            end_date: date(12, 31)?,
        })
        .await?;

    info!("Seeding money accounts");
    let cash_box = accounts
        .create(CreateAccountInput {
            name: "Cash Box".to_string(),
            account_type: AccountType::Cash,
            account_number: None,
            chart_account_id: by_code(&chart_accounts, "1010")?.id,
            overdraft_limit: Decimal::ZERO,
        })
        .await?;
    let bank_main = accounts
        .create(CreateAccountInput {
            name: "Bank Main".to_string(),
            account_type: AccountType::Bank,
            account_number: Some("0012-3456-7890".to_string()),
            chart_account_id: by_code(&chart_accounts, "1020")?.id,
            overdraft_limit: dec!(5000.00),
        })
        .await?;

    info!("Seeding budget and cost center");
    let supplies_budget = budgets
        .create_budget(CreateBudgetInput {
            name: "Office Supplies 2025".to_string(),
            scope: BudgetScope::Account(supplies.id),
            period_type: PeriodType::Annual,
            fiscal_year_id: fy2025.id,
            start_date: date(1, 1)?,
            end_date: date(12, 31)?,
            planned_amount: dec!(500.00),
            alert_threshold: None,
        })
        .await?;
    budgets.approve(supplies_budget.id, None)?;
    let front_office = budgets.create_cost_center(CreateCostCenterInput {
        code: "CC-FRONT".to_string(),
        name: "Front Office".to_string(),
        department_id: None,
        manager_id: None,
        month: date(1, 1)?,
        monthly_budget: dec!(400.00),
        alert_threshold: None,
    })?;

    info!("Seeding postings");
    ledger
        .deposit(DepositInput {
            account_id: cash_box.id,
            amount: dec!(1000.00),
            transaction_date: date(1, 5)?,
            description: Some("Owner capital".to_string()),
            chart_account_id: None,
            idempotency_key: Some(IdempotencyKey::new("seed-capital")?),
        })
        .await?;
    ledger
        .deposit(DepositInput {
            account_id: bank_main.id,
            amount: dec!(2450.00),
            transaction_date: date(1, 20)?,
            description: Some("January sales".to_string()),
            chart_account_id: Some(sales.id),
            idempotency_key: Some(IdempotencyKey::new("seed-sales-jan")?),
        })
        .await?;
    ledger
        .withdraw(WithdrawInput {
            account_id: cash_box.id,
            amount: dec!(300.00),
            transaction_date: date(1, 6)?,
            chart_account_id: supplies.id,
            description: Some("Printer paper and toner".to_string()),
            cost_center_id: Some(front_office.id),
            tax_percent: None,
            idempotency_key: Some(IdempotencyKey::new("seed-supplies")?),
        })
        .await?;
    ledger
        .transfer(TransferInput {
            from_account_id: cash_box.id,
            to_account_id: bank_main.id,
            amount: dec!(200.00),
            transaction_date: date(1, 7)?,
            description: Some("Cash lodgement".to_string()),
            idempotency_key: Some(IdempotencyKey::new("seed-lodgement")?),
        })
        .await?;
    ledger
        .withdraw(WithdrawInput {
            account_id: bank_main.id,
            amount: dec!(1500.00),
            transaction_date: date(1, 31)?,
            chart_account_id: rent.id,
            description: Some("January rent".to_string()),
            cost_center_id: None,
            tax_percent: None,
            idempotency_key: Some(IdempotencyKey::new("seed-rent-jan")?),
        })
        .await?;
    ledger
        .withdraw(WithdrawInput {
            account_id: bank_main.id,
            amount: dec!(120.00),
            transaction_date: date(1, 31)?,
            chart_account_id: utilities.id,
            description: Some("Electricity".to_string()),
            cost_center_id: Some(front_office.id),
            tax_percent: Some(dec!(5)),
            idempotency_key: Some(IdempotencyKey::new("seed-power-jan")?),
        })
        .await?;

    for account in [cash_box.id, bank_main.id] {
        accounts.verify_integrity(account).await?;
    }

    let trial_balance = reports.trial_balance(date(1, 31)?, false).await?;
    let reconciliation = reports.reconcile().await?;
    let budget = budgets.get_budget(supplies_budget.id)?;
    let cost_center = budgets.get_cost_center(front_office.id)?;

    info!(
        entries = db.entry_count(),
        last_sequence = db.last_sequence(),
        balanced = trial_balance.is_balanced,
        reconciled = reconciliation.is_reconciled,
        "Seeding complete"
    );

    let output = serde_json::json!({
        "trial_balance": trial_balance,
        "reconciliation": reconciliation,
        "budget_utilization": budget.utilization(),
        "cost_center_utilization": cost_center.utilization(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
