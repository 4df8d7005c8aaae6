//! Budget and cost-center repository.
//!
//! Actuals are never incremented in place: every recomputation sums the
//! journal's expense postings again under the recalculation lock, so the
//! last recomputation always reflects every published entry.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use hisab_core::budget::{
    AllocateInput, AllocationRecord, AllocationTarget, Budget, BudgetError, BudgetScope,
    BudgetService, CostCenter, CreateBudgetInput, CreateCostCenterInput, ExpensePosting,
    Utilization,
};
use hisab_core::ledger::LedgerEntry;
use hisab_shared::types::{AllocationId, BudgetId, CostCenterId, DepartmentId, UserId};
use serde::Serialize;
use tracing::{debug, info};

use crate::database::Database;

/// The entity an allocation changed, after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatedEntity {
    /// Budget with its increased planned amount.
    Budget(Budget),
    /// Cost center with its increased monthly budget.
    CostCenter(CostCenter),
}

/// Result of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    /// The audit record appended for this allocation.
    pub record: AllocationRecord,
    /// Updated target.
    pub entity: AllocatedEntity,
}

/// Budget and cost-center repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: Database,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a draft budget and computes its actual from existing postings.
    ///
    /// # Errors
    ///
    /// - `FiscalYearNotFound` if the fiscal year does not exist
    /// - `InvalidScope` for an account scope that is not an expense account
    /// - any validation error of `Budget::new`
    pub async fn create_budget(&self, input: CreateBudgetInput) -> Result<Budget, BudgetError> {
        let fiscal_year_id = input.fiscal_year_id;
        if !self
            .db
            .fiscal_years()
            .read()
            .await
            .iter()
            .any(|year| year.id == fiscal_year_id)
        {
            return Err(BudgetError::FiscalYearNotFound(fiscal_year_id));
        }
        // The chart guard is held until the budget is stored so the scoped
        // account cannot be reclassified in between.
        let chart = self.db.chart().read().await;
        let scoped = match input.scope {
            BudgetScope::Account(id) => Some(id),
            BudgetScope::Company | BudgetScope::Department(_) => None,
        };
        BudgetService::validate_scope(input.scope, scoped.and_then(|id| chart.get(id)))?;

        let mut budget = Budget::new(input, Utc::now())?;
        {
            let _recalculation = self.db.recalculation().lock();
            let actual = BudgetService::budget_actual(&budget, &expense_snapshot(&self.db));
            budget.apply_actual(actual, Utc::now());
            self.db.budgets().insert(budget.id, budget.clone());
        }
        if let Some(id) = scoped {
            chart.mark_linked(id);
        }
        drop(chart);

        info!(
            budget_id = %budget.id,
            name = %budget.name,
            planned_amount = %budget.planned_amount,
            "Budget created"
        );
        Ok(budget)
    }

    /// Gets a budget.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub fn get_budget(&self, id: BudgetId) -> Result<Budget, BudgetError> {
        self.db
            .budgets()
            .get(&id)
            .map(|budget| budget.clone())
            .ok_or(BudgetError::NotFound(id))
    }

    /// Lists every budget ordered by start date, then name.
    pub fn list_budgets(&self) -> Vec<Budget> {
        let mut budgets: Vec<Budget> = self
            .db
            .budgets()
            .iter()
            .map(|budget| budget.clone())
            .collect();
        budgets.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.name.cmp(&b.name)));
        budgets
    }

    /// Approves a draft budget.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidStatusTransition` unless it is a draft.
    pub fn approve(
        &self,
        id: BudgetId,
        approved_by: Option<UserId>,
    ) -> Result<Budget, BudgetError> {
        let mut budget = self.db.budgets().get_mut(&id).ok_or(BudgetError::NotFound(id))?;
        budget.approve(approved_by, Utc::now())?;

        info!(budget_id = %id, status = %budget.status, "Budget approved");
        Ok(budget.clone())
    }

    /// Completes a budget whose period ended before `today`, freezing its
    /// actual.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidStatusTransition`, or `PeriodNotEnded`.
    pub fn complete(&self, id: BudgetId, today: NaiveDate) -> Result<Budget, BudgetError> {
        let mut budget = self.db.budgets().get_mut(&id).ok_or(BudgetError::NotFound(id))?;
        budget.complete(today, Utc::now())?;

        info!(budget_id = %id, actual_amount = %budget.actual_amount, "Budget completed");
        Ok(budget.clone())
    }

    /// Adds to a budget's planned amount or a cost center's monthly budget
    /// and appends an audit record.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless the amount is positive
    /// - `NotFound` / `CostCenterNotFound` for an unknown target
    /// - `Frozen` for a completed budget
    pub fn allocate(&self, input: AllocateInput) -> Result<AllocationResult, BudgetError> {
        BudgetService::validate_allocation(input.amount, self.db.config().ledger.amount_scale)?;
        let now = Utc::now();

        let (entity, resulting_total) = match input.target {
            AllocationTarget::Budget(id) => {
                let mut budget = self.db.budgets().get_mut(&id).ok_or(BudgetError::NotFound(id))?;
                budget.allocate(input.amount, now)?;
                let total = budget.planned_amount;
                (AllocatedEntity::Budget(budget.clone()), total)
            }
            AllocationTarget::CostCenter(id) => {
                let mut cost_center = self
                    .db
                    .cost_centers()
                    .get_mut(&id)
                    .ok_or(BudgetError::CostCenterNotFound(id))?;
                cost_center.allocate(input.amount, now);
                let total = cost_center.monthly_budget;
                (AllocatedEntity::CostCenter(cost_center.clone()), total)
            }
        };

        let record = AllocationRecord {
            id: AllocationId::new(),
            target: input.target,
            amount: input.amount,
            notes: input
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            allocated_by: input.allocated_by,
            allocated_at: now,
            resulting_total,
        };
        self.db.allocations().write().push(record.clone());

        info!(
            allocation_id = %record.id,
            target = ?record.target,
            amount = %record.amount,
            resulting_total = %resulting_total,
            "Budget allocated"
        );
        Ok(AllocationResult { record, entity })
    }

    /// Allocation audit records, oldest first, optionally for one target.
    pub fn list_allocations(&self, target: Option<AllocationTarget>) -> Vec<AllocationRecord> {
        self.db
            .allocations()
            .read()
            .iter()
            .filter(|record| target.is_none_or(|target| record.target == target))
            .cloned()
            .collect()
    }

    /// Creates a cost center for one month.
    ///
    /// # Errors
    ///
    /// `DuplicateCode` if the code is taken, or a validation error of
    /// `CostCenter::new`.
    pub fn create_cost_center(
        &self,
        input: CreateCostCenterInput,
    ) -> Result<CostCenter, BudgetError> {
        let cost_center = CostCenter::new(input, Utc::now())?;
        match self.db.cost_center_codes().entry(cost_center.code.clone()) {
            Entry::Occupied(_) => {
                return Err(BudgetError::DuplicateCode(cost_center.code));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(cost_center.id);
            }
        }
        self.db
            .cost_centers()
            .insert(cost_center.id, cost_center.clone());

        info!(
            cost_center_id = %cost_center.id,
            code = %cost_center.code,
            monthly_budget = %cost_center.monthly_budget,
            "Cost center created"
        );
        Ok(cost_center)
    }

    /// Gets a cost center.
    ///
    /// # Errors
    ///
    /// Returns `CostCenterNotFound` if it does not exist.
    pub fn get_cost_center(&self, id: CostCenterId) -> Result<CostCenter, BudgetError> {
        self.db
            .cost_centers()
            .get(&id)
            .map(|cost_center| cost_center.clone())
            .ok_or(BudgetError::CostCenterNotFound(id))
    }

    /// Lists every cost center ordered by code.
    pub fn list_cost_centers(&self) -> Vec<CostCenter> {
        let mut cost_centers: Vec<CostCenter> = self
            .db
            .cost_centers()
            .iter()
            .map(|cost_center| cost_center.clone())
            .collect();
        cost_centers.sort_by(|a, b| a.code.cmp(&b.code));
        cost_centers
    }

    /// Recomputes a budget's actual from the journal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub fn recalculate_budget(&self, id: BudgetId) -> Result<Budget, BudgetError> {
        let _recalculation = self.db.recalculation().lock();
        let postings = expense_snapshot(&self.db);
        let mut budget = self.db.budgets().get_mut(&id).ok_or(BudgetError::NotFound(id))?;
        let actual = BudgetService::budget_actual(&budget, &postings);
        budget.apply_actual(actual, Utc::now());

        info!(
            budget_id = %id,
            actual_amount = %budget.actual_amount,
            status = %budget.status,
            "Budget recalculated"
        );
        Ok(budget.clone())
    }

    /// Recomputes a cost center's spend for its month from the journal.
    ///
    /// # Errors
    ///
    /// Returns `CostCenterNotFound` if it does not exist.
    pub fn recalculate_cost_center(&self, id: CostCenterId) -> Result<CostCenter, BudgetError> {
        let _recalculation = self.db.recalculation().lock();
        let postings = expense_snapshot(&self.db);
        let mut cost_center = self
            .db
            .cost_centers()
            .get_mut(&id)
            .ok_or(BudgetError::CostCenterNotFound(id))?;
        let actual = BudgetService::cost_center_actual(&cost_center, &postings);
        cost_center.apply_actual(actual, Utc::now());

        info!(cost_center_id = %id, actual_spent = %actual, "Cost center recalculated");
        Ok(cost_center.clone())
    }

    /// Derived utilization of a budget.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub fn utilization(&self, id: BudgetId) -> Result<Utilization, BudgetError> {
        self.get_budget(id).map(|budget| budget.utilization())
    }

    /// Derived utilization of a cost center.
    ///
    /// # Errors
    ///
    /// Returns `CostCenterNotFound` if it does not exist.
    pub fn cost_center_utilization(&self, id: CostCenterId) -> Result<Utilization, BudgetError> {
        self.get_cost_center(id)
            .map(|cost_center| cost_center.utilization())
    }
}

/// Recomputes every budget and cost center a freshly published expense
/// entry counts toward. Called after the posting released its locks.
pub(crate) fn refresh_after_posting(db: &Database, entry: &LedgerEntry) {
    if !entry.is_expense() {
        return;
    }
    let _recalculation = db.recalculation().lock();
    let departments = department_index(db);
    let touched = BudgetService::expense_postings([entry], |id| departments.get(&id).copied());
    let Some(posting) = touched.first() else {
        return;
    };
    let postings = expense_postings_of(db, &departments);
    let now = Utc::now();

    for mut budget in db.budgets().iter_mut() {
        if budget.is_frozen() || !BudgetService::affects_budget(&budget, posting) {
            continue;
        }
        let actual = BudgetService::budget_actual(&budget, &postings);
        budget.apply_actual(actual, now);
        debug!(
            budget_id = %budget.id,
            actual_amount = %actual,
            needs_alert = budget.needs_alert(),
            "Budget actual refreshed"
        );
    }

    if let Some(cost_center_id) = posting.cost_center_id {
        if let Some(mut cost_center) = db.cost_centers().get_mut(&cost_center_id) {
            if BudgetService::affects_cost_center(&cost_center, posting) {
                let actual = BudgetService::cost_center_actual(&cost_center, &postings);
                cost_center.apply_actual(actual, now);
                debug!(
                    cost_center_id = %cost_center_id,
                    actual_spent = %actual,
                    "Cost center actual refreshed"
                );
            }
        }
    }
}

fn department_index(db: &Database) -> HashMap<CostCenterId, DepartmentId> {
    db.cost_centers()
        .iter()
        .filter_map(|cost_center| cost_center.department_id.map(|d| (cost_center.id, d)))
        .collect()
}

fn expense_postings_of(
    db: &Database,
    departments: &HashMap<CostCenterId, DepartmentId>,
) -> Vec<ExpensePosting> {
    let journal = db.journal().read();
    BudgetService::expense_postings(journal.iter(), |id| departments.get(&id).copied())
}

fn expense_snapshot(db: &Database) -> Vec<ExpensePosting> {
    let departments = department_index(db);
    expense_postings_of(db, &departments)
}
