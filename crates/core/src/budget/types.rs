//! Budget and cost-center data types.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use hisab_shared::types::money::percentage_of;
use hisab_shared::types::{
    AllocationId, BudgetId, ChartAccountId, CostCenterId, DepartmentId, FiscalYearId, UserId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;
use super::variance::BudgetVariance;

/// Default alert threshold, in percent of the planned amount.
pub const DEFAULT_ALERT_THRESHOLD: Decimal = dec!(80);

/// What a budget tracks spend against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope_type", content = "scope_id", rename_all = "snake_case")]
pub enum BudgetScope {
    /// Every expense posting of the company.
    Company,
    /// Expense postings tagged to a cost center of this department.
    Department(DepartmentId),
    /// Expense postings classified to this expense account.
    Account(ChartAccountId),
}

/// Budget period granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// One calendar month.
    Monthly,
    /// One quarter.
    Quarterly,
    /// A full fiscal year.
    Annual,
    /// Any other range.
    Custom,
}

/// Budget lifecycle.
///
/// `Draft -> Active` on approval; `Active <-> Exceeded` as actuals move;
/// `Active | Exceeded -> Completed` once the period has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Being prepared; not yet approved.
    Draft,
    /// Approved and tracking spend.
    Active,
    /// Period ended; actuals are frozen.
    Completed,
    /// Actual spend is above the planned amount.
    Exceeded,
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Exceeded => "exceeded",
        };
        f.write_str(name)
    }
}

/// Derived utilization view over a planned and an actual amount.
///
/// Never stored; always computed from the base fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utilization {
    /// Planned amount.
    pub planned: Decimal,
    /// Actual spend.
    pub actual: Decimal,
    /// `actual / planned * 100`, uncapped.
    pub usage_percentage: Decimal,
    /// `usage_percentage` capped at 100 for display.
    pub display_usage_percentage: Decimal,
    /// `actual > planned`.
    pub is_exceeded: bool,
    /// `usage_percentage >= alert_threshold`, or exceeded.
    pub needs_alert: bool,
    /// `planned - actual`; negative when exceeded.
    pub remaining: Decimal,
    /// Expense variance against the plan.
    pub variance: BudgetVariance,
}

impl Utilization {
    /// Computes the view.
    #[must_use]
    pub fn compute(planned: Decimal, actual: Decimal, alert_threshold: Decimal) -> Self {
        let usage_percentage = percentage_of(actual, planned);
        let is_exceeded = actual > planned;
        Self {
            planned,
            actual,
            usage_percentage,
            display_usage_percentage: usage_percentage.min(Decimal::ONE_HUNDRED),
            is_exceeded,
            needs_alert: is_exceeded || usage_percentage >= alert_threshold,
            remaining: planned - actual,
            variance: BudgetVariance::for_expense(planned, actual),
        }
    }
}

/// A planned spend limit over a date range and scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier.
    pub id: BudgetId,
    /// Display name.
    pub name: String,
    /// What the budget tracks.
    #[serde(flatten)]
    pub scope: BudgetScope,
    /// Period granularity.
    pub period_type: PeriodType,
    /// Fiscal year the budget belongs to.
    pub fiscal_year_id: FiscalYearId,
    /// First day covered (inclusive).
    pub start_date: NaiveDate,
    /// Last day covered (inclusive).
    pub end_date: NaiveDate,
    /// Planned amount; grows only through allocations.
    pub planned_amount: Decimal,
    /// Actual spend, recomputed from ledger entries.
    pub actual_amount: Decimal,
    /// Alert threshold in percent.
    pub alert_threshold: Decimal,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Who approved the budget.
    pub approved_by: Option<UserId>,
    /// When the budget was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudgetInput {
    /// Display name.
    pub name: String,
    /// What the budget tracks.
    #[serde(flatten)]
    pub scope: BudgetScope,
    /// Period granularity.
    pub period_type: PeriodType,
    /// Fiscal year the budget belongs to.
    pub fiscal_year_id: FiscalYearId,
    /// First day covered (inclusive).
    pub start_date: NaiveDate,
    /// Last day covered (inclusive).
    pub end_date: NaiveDate,
    /// Planned amount.
    pub planned_amount: Decimal,
    /// Alert threshold in percent; defaults to 80.
    #[serde(default)]
    pub alert_threshold: Option<Decimal>,
}

impl Budget {
    /// Builds a draft budget.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty name or a threshold outside (0, 100]
    /// - `InvalidDateRange` when `start_date > end_date`
    /// - `NegativeAmount` for a negative planned amount
    pub fn new(input: CreateBudgetInput, now: DateTime<Utc>) -> Result<Self, BudgetError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(BudgetError::InvalidInput(
                "budget name cannot be empty".to_string(),
            ));
        }
        if input.start_date > input.end_date {
            return Err(BudgetError::InvalidDateRange {
                start: input.start_date,
                end: input.end_date,
            });
        }
        if input.planned_amount < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        let alert_threshold = validate_threshold(input.alert_threshold)?;

        Ok(Self {
            id: BudgetId::new(),
            name: name.to_string(),
            scope: input.scope,
            period_type: input.period_type,
            fiscal_year_id: input.fiscal_year_id,
            start_date: input.start_date,
            end_date: input.end_date,
            planned_amount: input.planned_amount,
            actual_amount: Decimal::ZERO,
            alert_threshold,
            status: BudgetStatus::Draft,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if `date` falls inside the budget period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true once the budget no longer tracks spend.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.status == BudgetStatus::Completed
    }

    /// `actual / planned * 100`, uncapped.
    #[must_use]
    pub fn usage_percentage(&self) -> Decimal {
        percentage_of(self.actual_amount, self.planned_amount)
    }

    /// Usage capped at 100 for display.
    #[must_use]
    pub fn display_usage_percentage(&self) -> Decimal {
        self.usage_percentage().min(Decimal::ONE_HUNDRED)
    }

    /// `actual > planned`.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.actual_amount > self.planned_amount
    }

    /// Usage has reached the alert threshold.
    #[must_use]
    pub fn needs_alert(&self) -> bool {
        self.is_exceeded() || self.usage_percentage() >= self.alert_threshold
    }

    /// `planned - actual`.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.planned_amount - self.actual_amount
    }

    /// Full derived view.
    #[must_use]
    pub fn utilization(&self) -> Utilization {
        Utilization::compute(self.planned_amount, self.actual_amount, self.alert_threshold)
    }

    /// Approves a draft budget.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` unless the budget is a draft.
    pub fn approve(&mut self, by: Option<UserId>, now: DateTime<Utc>) -> Result<(), BudgetError> {
        if self.status != BudgetStatus::Draft {
            return Err(self.transition_error(BudgetStatus::Active));
        }
        self.status = BudgetStatus::Active;
        self.approved_by = by;
        self.approved_at = Some(now);
        self.updated_at = now;
        self.refresh_status();
        Ok(())
    }

    /// Completes the budget once its period has ended.
    ///
    /// # Errors
    ///
    /// - `InvalidStatusTransition` unless the budget is active or exceeded
    /// - `PeriodNotEnded` while `today <= end_date`
    pub fn complete(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<(), BudgetError> {
        if !matches!(self.status, BudgetStatus::Active | BudgetStatus::Exceeded) {
            return Err(self.transition_error(BudgetStatus::Completed));
        }
        if today <= self.end_date {
            return Err(BudgetError::PeriodNotEnded {
                budget_id: self.id,
                end_date: self.end_date,
            });
        }
        self.status = BudgetStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Stores a recomputed actual. Completed budgets keep their frozen actual.
    pub fn apply_actual(&mut self, actual: Decimal, now: DateTime<Utc>) {
        if self.is_frozen() {
            return;
        }
        self.actual_amount = actual;
        self.updated_at = now;
        self.refresh_status();
    }

    /// Adds `amount` to the planned amount.
    ///
    /// # Errors
    ///
    /// Returns `Frozen` for a completed budget.
    pub fn allocate(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), BudgetError> {
        if self.is_frozen() {
            return Err(BudgetError::Frozen(self.id));
        }
        self.planned_amount += amount;
        self.updated_at = now;
        self.refresh_status();
        Ok(())
    }

    fn refresh_status(&mut self) {
        self.status = match self.status {
            BudgetStatus::Active if self.is_exceeded() => BudgetStatus::Exceeded,
            BudgetStatus::Exceeded if !self.is_exceeded() => BudgetStatus::Active,
            other => other,
        };
    }

    fn transition_error(&self, to: BudgetStatus) -> BudgetError {
        BudgetError::InvalidStatusTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// A budget-tracking scope with a monthly spend limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    /// Unique identifier.
    pub id: CostCenterId,
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Department the cost center belongs to.
    pub department_id: Option<DepartmentId>,
    /// Responsible manager.
    pub manager_id: Option<UserId>,
    /// First day of the budget month.
    pub period_start: NaiveDate,
    /// Last day of the budget month.
    pub period_end: NaiveDate,
    /// Monthly budget; grows only through allocations.
    pub monthly_budget: Decimal,
    /// Actual spend in the month, recomputed from ledger entries.
    pub actual_spent: Decimal,
    /// Alert threshold in percent.
    pub alert_threshold: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a cost center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCostCenterInput {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Department the cost center belongs to.
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    /// Responsible manager.
    #[serde(default)]
    pub manager_id: Option<UserId>,
    /// Any day of the month the budget covers.
    pub month: NaiveDate,
    /// Starting monthly budget.
    #[serde(default)]
    pub monthly_budget: Decimal,
    /// Alert threshold in percent; defaults to 80.
    #[serde(default)]
    pub alert_threshold: Option<Decimal>,
}

impl CostCenter {
    /// Builds a cost center covering the month of `input.month`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty code or name or a bad threshold
    /// - `NegativeAmount` for a negative starting budget
    pub fn new(input: CreateCostCenterInput, now: DateTime<Utc>) -> Result<Self, BudgetError> {
        let code = input.code.trim();
        let name = input.name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(BudgetError::InvalidInput(
                "cost center code and name are required".to_string(),
            ));
        }
        if input.monthly_budget < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        let alert_threshold = validate_threshold(input.alert_threshold)?;
        let (period_start, period_end) = month_bounds(input.month)?;

        Ok(Self {
            id: CostCenterId::new(),
            code: code.to_string(),
            name: name.to_string(),
            department_id: input.department_id,
            manager_id: input.manager_id,
            period_start,
            period_end,
            monthly_budget: input.monthly_budget,
            actual_spent: Decimal::ZERO,
            alert_threshold,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if `date` falls inside the budget month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.period_start && date <= self.period_end
    }

    /// Full derived view.
    #[must_use]
    pub fn utilization(&self) -> Utilization {
        Utilization::compute(self.monthly_budget, self.actual_spent, self.alert_threshold)
    }

    /// Stores a recomputed actual.
    pub fn apply_actual(&mut self, actual: Decimal, now: DateTime<Utc>) {
        self.actual_spent = actual;
        self.updated_at = now;
    }

    /// Adds `amount` to the monthly budget.
    pub fn allocate(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.monthly_budget += amount;
        self.updated_at = now;
    }
}

/// What an allocation was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target_type", content = "target_id", rename_all = "snake_case")]
pub enum AllocationTarget {
    /// A budget's planned amount.
    Budget(BudgetId),
    /// A cost center's monthly budget.
    CostCenter(CostCenterId),
}

/// Append-only audit record of one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Unique identifier.
    pub id: AllocationId,
    /// Target of the allocation.
    #[serde(flatten)]
    pub target: AllocationTarget,
    /// Amount added.
    pub amount: Decimal,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Who allocated.
    pub allocated_by: Option<UserId>,
    /// When the allocation happened.
    pub allocated_at: DateTime<Utc>,
    /// Planned amount / monthly budget after the allocation.
    pub resulting_total: Decimal,
}

/// Input for an allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateInput {
    /// Target of the allocation.
    #[serde(flatten)]
    pub target: AllocationTarget,
    /// Positive amount to add.
    pub amount: Decimal,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Who allocates.
    #[serde(default)]
    pub allocated_by: Option<UserId>,
}

/// The slice of an expense ledger entry the tracker needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpensePosting {
    /// Expense account the spend is classified to.
    pub chart_account_id: ChartAccountId,
    /// Cost center the spend is tagged to.
    pub cost_center_id: Option<CostCenterId>,
    /// Department of that cost center.
    pub department_id: Option<DepartmentId>,
    /// Posting date.
    pub transaction_date: NaiveDate,
    /// Gross amount spent.
    pub amount: Decimal,
}

fn validate_threshold(threshold: Option<Decimal>) -> Result<Decimal, BudgetError> {
    let threshold = threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);
    if threshold <= Decimal::ZERO || threshold > Decimal::ONE_HUNDRED {
        return Err(BudgetError::InvalidInput(format!(
            "alert threshold must be in (0, 100], got {threshold}"
        )));
    }
    Ok(threshold)
}

/// First and last day of the month containing `date`.
///
/// # Errors
///
/// Returns `InvalidInput` at the edge of the representable calendar.
pub fn month_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), BudgetError> {
    let out_of_range = || BudgetError::InvalidInput(format!("month out of range: {date}"));
    let start = date.with_day(1).ok_or_else(out_of_range)?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}
