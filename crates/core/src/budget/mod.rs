//! Budget and cost-center tracking against actual spend.

pub mod error;
pub mod service;
pub mod types;
pub mod variance;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::BudgetService;
pub use types::{
    AllocateInput, AllocationRecord, AllocationTarget, Budget, BudgetScope, BudgetStatus,
    CostCenter, CreateBudgetInput, CreateCostCenterInput, DEFAULT_ALERT_THRESHOLD,
    ExpensePosting, PeriodType, Utilization, month_bounds,
};
pub use variance::{BudgetVariance, VarianceType};
