//! Budget variance calculations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type of variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceType {
    /// Actual is under budget (favorable for expenses).
    Favorable,
    /// Actual is over budget (unfavorable for expenses).
    Unfavorable,
    /// No variance.
    None,
}

/// Budget vs actual variance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVariance {
    /// Budgeted amount.
    pub budget_amount: Decimal,
    /// Actual amount.
    pub actual_amount: Decimal,
    /// Variance amount.
    pub variance_amount: Decimal,
    /// Variance percentage of the budget, rounded to two places.
    pub variance_percentage: Decimal,
    /// Type of variance.
    pub variance_type: VarianceType,
}

impl BudgetVariance {
    /// Variance of spend against a planned amount: under plan is
    /// favorable, over plan is unfavorable.
    #[must_use]
    pub fn for_expense(budget: Decimal, actual: Decimal) -> Self {
        let variance = budget - actual;
        let percentage = if budget.is_zero() {
            Decimal::ZERO
        } else {
            (variance / budget * Decimal::ONE_HUNDRED).round_dp(2)
        };

        let variance_type = match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => VarianceType::Favorable,
            std::cmp::Ordering::Less => VarianceType::Unfavorable,
            std::cmp::Ordering::Equal => VarianceType::None,
        };

        Self {
            budget_amount: budget,
            actual_amount: actual,
            variance_amount: variance,
            variance_percentage: percentage,
            variance_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_expense_variance_favorable() {
        let result = BudgetVariance::for_expense(dec!(1000), dec!(800));
        assert_eq!(result.variance_amount, dec!(200));
        assert_eq!(result.variance_percentage, dec!(20.00));
        assert_eq!(result.variance_type, VarianceType::Favorable);
    }

    #[test]
    fn test_expense_variance_unfavorable() {
        let result = BudgetVariance::for_expense(dec!(1000), dec!(1200));
        assert_eq!(result.variance_amount, dec!(-200));
        assert_eq!(result.variance_percentage, dec!(-20.00));
        assert_eq!(result.variance_type, VarianceType::Unfavorable);
    }

    #[test]
    fn test_zero_budget_variance_percentage() {
        let result = BudgetVariance::for_expense(dec!(0), dec!(500));
        assert_eq!(result.variance_percentage, dec!(0));
        assert_eq!(result.variance_type, VarianceType::Unfavorable);
    }

    #[test]
    fn test_on_budget() {
        let result = BudgetVariance::for_expense(dec!(500), dec!(500));
        assert_eq!(result.variance_type, VarianceType::None);
    }
}
