//! Property-based and lifecycle tests for the budget module.

use chrono::{NaiveDate, Utc};
use hisab_shared::types::{ChartAccountId, FiscalYearId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::BudgetError;
use super::service::BudgetService;
use super::types::{
    Budget, BudgetScope, BudgetStatus, CostCenter, CreateBudgetInput, CreateCostCenterInput,
    ExpensePosting, PeriodType, Utilization, month_bounds,
};
use super::variance::VarianceType;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn office_supplies_budget(planned: Decimal) -> Budget {
    Budget::new(
        CreateBudgetInput {
            name: "Office Supplies 2025".to_string(),
            scope: BudgetScope::Account(ChartAccountId::new()),
            period_type: PeriodType::Annual,
            fiscal_year_id: FiscalYearId::new(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            planned_amount: planned,
            alert_threshold: Some(dec!(80)),
        },
        Utc::now(),
    )
    .unwrap()
}

proptest! {
    /// **Property: Usage is stored uncapped and displayed capped**
    ///
    /// *For any* planned and actual amounts, display usage SHALL equal
    /// `min(usage, 100)` and `is_exceeded` SHALL equal `actual > planned`.
    #[test]
    fn prop_usage_capped_for_display(
        planned in 1i64..1_000_000,
        actual in 0i64..2_000_000,
    ) {
        let planned = Decimal::new(planned, 2);
        let actual = Decimal::new(actual, 2);
        let view = Utilization::compute(planned, actual, dec!(80));

        prop_assert_eq!(view.display_usage_percentage, view.usage_percentage.min(dec!(100)));
        prop_assert_eq!(view.is_exceeded, actual > planned);
        prop_assert_eq!(view.remaining, planned - actual);
        if view.is_exceeded {
            prop_assert!(view.usage_percentage >= dec!(100));
            prop_assert!(view.needs_alert);
        }
    }

    /// **Property: Alert fires exactly at the threshold**
    ///
    /// *For any* threshold, `needs_alert` SHALL be true iff usage reaches it
    /// (or the plan is exceeded).
    #[test]
    fn prop_alert_threshold(
        threshold in 1i64..=100,
        actual in 0i64..=10_000,
    ) {
        let threshold = Decimal::from(threshold);
        let actual = Decimal::new(actual, 2);
        let view = Utilization::compute(dec!(100), actual, threshold);
        prop_assert_eq!(view.needs_alert, view.usage_percentage >= threshold || actual > dec!(100));
    }

    /// **Property: Expense variance sign follows spend**
    #[test]
    fn prop_expense_variance(
        budgeted in 0i64..1_000_000_000,
        actual in 0i64..1_000_000_000,
    ) {
        let budgeted = Decimal::from(budgeted);
        let actual = Decimal::from(actual);
        let result = Utilization::compute(budgeted, actual, dec!(80)).variance;

        prop_assert_eq!(result.variance_amount, budgeted - actual);
        if result.variance_amount > Decimal::ZERO {
            prop_assert_eq!(result.variance_type, VarianceType::Favorable);
        } else if result.variance_amount < Decimal::ZERO {
            prop_assert_eq!(result.variance_type, VarianceType::Unfavorable);
        } else {
            prop_assert_eq!(result.variance_type, VarianceType::None);
        }
    }

    /// **Property: Allocations are additive**
    ///
    /// *For any* sequence of positive allocations, the planned amount SHALL
    /// equal the starting plan plus their sum.
    #[test]
    fn prop_allocations_are_additive(
        amounts in prop::collection::vec(1i64..1_000_000, 1..20),
    ) {
        let mut budget = office_supplies_budget(dec!(500.00));
        let amounts: Vec<Decimal> = amounts.into_iter().map(|a| Decimal::new(a, 2)).collect();
        for amount in &amounts {
            prop_assert!(BudgetService::validate_allocation(*amount, 2).is_ok());
            budget.allocate(*amount, Utc::now()).unwrap();
        }
        let total: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(budget.planned_amount, dec!(500.00) + total);
    }

    /// **Property: Recomputed actual equals the sum of matching postings**
    #[test]
    fn prop_cost_center_actual(
        amounts in prop::collection::vec(1i64..100_000, 0..20),
        days in prop::collection::vec(1u32..=28, 20),
    ) {
        let cc = CostCenter::new(
            CreateCostCenterInput {
                code: "CC-OPS".to_string(),
                name: "Operations".to_string(),
                department_id: None,
                manager_id: None,
                month: date(2025, 1, 15),
                monthly_budget: dec!(1000),
                alert_threshold: None,
            },
            Utc::now(),
        )
        .unwrap();

        let postings: Vec<ExpensePosting> = amounts
            .iter()
            .zip(days.iter())
            .map(|(amount, day)| ExpensePosting {
                chart_account_id: ChartAccountId::new(),
                cost_center_id: Some(cc.id),
                department_id: None,
                transaction_date: date(2025, 1, *day),
                amount: Decimal::new(*amount, 2),
            })
            .collect();

        let expected: Decimal = postings.iter().map(|p| p.amount).sum();
        prop_assert_eq!(BudgetService::cost_center_actual(&cc, &postings), expected);
    }
}

#[test]
fn test_example_usage_sixty_percent() {
    let mut budget = office_supplies_budget(dec!(500.00));
    budget.approve(None, Utc::now()).unwrap();
    budget.apply_actual(dec!(300.00), Utc::now());

    assert_eq!(budget.actual_amount, dec!(300.00));
    assert_eq!(budget.usage_percentage(), dec!(60));
    assert!(!budget.is_exceeded());
    assert!(!budget.needs_alert());
    assert_eq!(budget.remaining(), dec!(200.00));
    assert_eq!(budget.status, BudgetStatus::Active);
}

#[test]
fn test_exceeded_then_allocation_reactivates() {
    let mut budget = office_supplies_budget(dec!(500.00));
    budget.approve(None, Utc::now()).unwrap();
    budget.apply_actual(dec!(650.00), Utc::now());

    assert_eq!(budget.status, BudgetStatus::Exceeded);
    assert_eq!(budget.usage_percentage(), dec!(130));
    assert_eq!(budget.display_usage_percentage(), dec!(100));

    budget.allocate(dec!(200.00), Utc::now()).unwrap();
    assert_eq!(budget.planned_amount, dec!(700.00));
    assert_eq!(budget.status, BudgetStatus::Active);
}

#[test]
fn test_draft_keeps_status_while_tracking() {
    let mut budget = office_supplies_budget(dec!(100.00));
    budget.apply_actual(dec!(150.00), Utc::now());
    assert_eq!(budget.status, BudgetStatus::Draft);
    assert!(budget.is_exceeded());
}

#[test]
fn test_approve_twice_fails() {
    let mut budget = office_supplies_budget(dec!(100.00));
    budget.approve(None, Utc::now()).unwrap();
    assert!(matches!(
        budget.approve(None, Utc::now()),
        Err(BudgetError::InvalidStatusTransition { .. })
    ));
}

#[test]
fn test_complete_requires_period_end_and_freezes() {
    let mut budget = office_supplies_budget(dec!(500.00));
    budget.approve(None, Utc::now()).unwrap();

    assert!(matches!(
        budget.complete(date(2025, 12, 31), Utc::now()),
        Err(BudgetError::PeriodNotEnded { .. })
    ));

    budget.complete(date(2026, 1, 1), Utc::now()).unwrap();
    assert_eq!(budget.status, BudgetStatus::Completed);

    budget.apply_actual(dec!(999.00), Utc::now());
    assert_eq!(budget.actual_amount, Decimal::ZERO);
    assert_eq!(
        budget.allocate(dec!(1), Utc::now()),
        Err(BudgetError::Frozen(budget.id))
    );
}

#[test]
fn test_budget_rejects_inverted_range() {
    let result = Budget::new(
        CreateBudgetInput {
            name: "Bad".to_string(),
            scope: BudgetScope::Company,
            period_type: PeriodType::Custom,
            fiscal_year_id: FiscalYearId::new(),
            start_date: date(2025, 2, 1),
            end_date: date(2025, 1, 1),
            planned_amount: dec!(10),
            alert_threshold: None,
        },
        Utc::now(),
    );
    assert!(matches!(result, Err(BudgetError::InvalidDateRange { .. })));
}

#[test]
fn test_month_bounds() {
    assert_eq!(
        month_bounds(date(2024, 2, 14)).unwrap(),
        (date(2024, 2, 1), date(2024, 2, 29))
    );
    assert_eq!(
        month_bounds(date(2025, 12, 31)).unwrap(),
        (date(2025, 12, 1), date(2025, 12, 31))
    );
}

#[test]
fn test_scope_serializes_flat() {
    let budget = office_supplies_budget(dec!(1));
    let json = serde_json::to_value(&budget).unwrap();
    assert_eq!(json["scope_type"], "account");
    assert!(json["scope_id"].is_string());
    assert_eq!(json["status"], "draft");
}
