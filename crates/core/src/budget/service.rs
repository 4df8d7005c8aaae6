//! Budget service for actuals, scope matching, and allocation validation.

use hisab_shared::types::money::is_valid_amount;
use hisab_shared::types::{CostCenterId, DepartmentId};
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{Budget, BudgetScope, CostCenter, ExpensePosting};
use crate::chart::{ChartAccountType, ChartOfAccount};
use crate::ledger::entry::LedgerEntry;

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Validates an allocation amount.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidAmount` if the amount is not positive or
    /// carries more than `amount_scale` decimals.
    pub fn validate_allocation(amount: Decimal, amount_scale: u32) -> Result<(), BudgetError> {
        if is_valid_amount(amount, amount_scale) {
            Ok(())
        } else {
            Err(BudgetError::InvalidAmount(amount))
        }
    }

    /// Validates a budget scope.
    ///
    /// `chart` is the chart account an `Account` scope points at, if it
    /// exists. Department ids are owned elsewhere and accepted as given.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidScope` for an account scope that does not
    /// name an existing expense account.
    pub fn validate_scope(
        scope: BudgetScope,
        chart: Option<&ChartOfAccount>,
    ) -> Result<(), BudgetError> {
        match (scope, chart) {
            (BudgetScope::Company | BudgetScope::Department(_), _) => Ok(()),
            (BudgetScope::Account(id), Some(chart))
                if chart.id == id && chart.account_type == ChartAccountType::Expense =>
            {
                Ok(())
            }
            (BudgetScope::Account(id), Some(_)) => Err(BudgetError::InvalidScope(format!(
                "chart account {id} is not an expense account"
            ))),
            (BudgetScope::Account(id), None) => Err(BudgetError::InvalidScope(format!(
                "chart account {id} does not exist"
            ))),
        }
    }

    /// Extracts the expense postings from ledger entries.
    ///
    /// `department_of` resolves a cost center to its department.
    pub fn expense_postings<'a, D>(
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        department_of: D,
    ) -> Vec<ExpensePosting>
    where
        D: Fn(CostCenterId) -> Option<DepartmentId>,
    {
        entries
            .into_iter()
            .filter(|entry| entry.is_expense())
            .filter_map(|entry| {
                entry.chart_account_id.map(|chart_account_id| ExpensePosting {
                    chart_account_id,
                    cost_center_id: entry.cost_center_id,
                    department_id: entry.cost_center_id.and_then(&department_of),
                    transaction_date: entry.transaction_date,
                    amount: entry.amount,
                })
            })
            .collect()
    }

    /// Returns true if `posting` falls under `scope`.
    #[must_use]
    pub fn matches_scope(scope: BudgetScope, posting: &ExpensePosting) -> bool {
        match scope {
            BudgetScope::Company => true,
            BudgetScope::Account(chart_account_id) => posting.chart_account_id == chart_account_id,
            BudgetScope::Department(department_id) => {
                posting.department_id == Some(department_id)
            }
        }
    }

    /// Returns true if `posting` counts toward `budget`.
    #[must_use]
    pub fn affects_budget(budget: &Budget, posting: &ExpensePosting) -> bool {
        budget.contains(posting.transaction_date) && Self::matches_scope(budget.scope, posting)
    }

    /// Sum of postings that count toward `budget`.
    #[must_use]
    pub fn budget_actual(budget: &Budget, postings: &[ExpensePosting]) -> Decimal {
        postings
            .iter()
            .filter(|posting| Self::affects_budget(budget, posting))
            .map(|posting| posting.amount)
            .sum()
    }

    /// Returns true if `posting` counts toward `cost_center`.
    #[must_use]
    pub fn affects_cost_center(cost_center: &CostCenter, posting: &ExpensePosting) -> bool {
        posting.cost_center_id == Some(cost_center.id)
            && cost_center.contains(posting.transaction_date)
    }

    /// Sum of postings tagged to `cost_center` inside its month.
    #[must_use]
    pub fn cost_center_actual(cost_center: &CostCenter, postings: &[ExpensePosting]) -> Decimal {
        postings
            .iter()
            .filter(|posting| Self::affects_cost_center(cost_center, posting))
            .map(|posting| posting.amount)
            .sum()
    }
}
