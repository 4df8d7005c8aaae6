//! Property-based tests for journal and amount validation rules.

use hisab_shared::types::ChartAccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{JournalLine, JournalSide};
use super::error::LedgerError;
use super::validation::{validate_amount, validate_journal};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // Generate amounts from 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Strategy to generate a journal side.
fn side_strategy() -> impl Strategy<Value = JournalSide> {
    prop_oneof![Just(JournalSide::Debit), Just(JournalSide::Credit)]
}

fn line(side: JournalSide, amount: Decimal) -> JournalLine {
    JournalLine {
        chart_account_id: ChartAccountId::new(),
        side,
        amount,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property: Non-positive amounts are rejected**
    ///
    /// *For any* amount <= 0, amount validation SHALL fail with
    /// `InvalidAmount` carrying the offending amount.
    #[test]
    fn prop_negative_amount_rejected(amount in negative_amount()) {
        prop_assert_eq!(validate_amount(amount, 2), Err(LedgerError::InvalidAmount(amount)));
    }

    /// **Property: Over-precise amounts are rejected**
    ///
    /// *For any* amount with a non-zero third decimal, a 2-scale validation
    /// SHALL fail.
    #[test]
    fn prop_sub_cent_amount_rejected(mills in 1i64..100_000_000) {
        prop_assume!(mills % 10 != 0);
        let amount = Decimal::new(mills, 3);
        prop_assert!(validate_amount(amount, 2).is_err());
    }

    /// **Property: Mirrored lines always balance**
    ///
    /// *For any* list of amounts, posting each as one debit and one credit
    /// SHALL validate.
    #[test]
    fn prop_mirrored_lines_balance(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let lines: Vec<JournalLine> = amounts
            .iter()
            .flat_map(|a| [line(JournalSide::Debit, *a), line(JournalSide::Credit, *a)])
            .collect();
        prop_assert!(validate_journal(&lines).is_ok());
    }

    /// **Property: One extra line unbalances the journal**
    ///
    /// *For any* balanced journal plus one more positive line, validation
    /// SHALL fail with `UnbalancedJournal`.
    #[test]
    fn prop_extra_line_unbalances(
        amount in positive_amount(),
        extra in positive_amount(),
        side in side_strategy(),
    ) {
        let lines = vec![
            line(JournalSide::Debit, amount),
            line(JournalSide::Credit, amount),
            line(side, extra),
        ];
        let is_unbalanced = matches!(
            validate_journal(&lines),
            Err(LedgerError::UnbalancedJournal { .. })
        );
        prop_assert!(is_unbalanced);
    }

    /// **Property: Zero-amount lines are rejected**
    #[test]
    fn prop_zero_line_rejected(side in side_strategy(), other in positive_amount()) {
        let lines = vec![line(side, Decimal::ZERO), line(JournalSide::Debit, other)];
        prop_assert_eq!(validate_journal(&lines), Err(LedgerError::InvalidAmount(Decimal::ZERO)));
    }
}
