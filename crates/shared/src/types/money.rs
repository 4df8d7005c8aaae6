//! Fixed-point money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; rounding is banker's rounding
//! (round half to even) so repeated postings do not drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Default number of fractional digits for monetary amounts.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Returns true if `amount` is strictly positive and carries no more than
/// `max_scale` significant fractional digits.
///
/// Trailing zeros do not count: `10.500` is a valid 2-scale amount.
#[must_use]
pub fn is_valid_amount(amount: Decimal, max_scale: u32) -> bool {
    amount > Decimal::ZERO && amount.normalize().scale() <= max_scale
}

/// Rounds an amount to `scale` fractional digits using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

/// Applies a precomputed percentage (e.g. a VAT rate of `15` meaning 15%)
/// and rounds the result to `scale` digits.
#[must_use]
pub fn apply_percentage(amount: Decimal, percent: Decimal, scale: u32) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED, scale)
}

/// Computes `part / whole * 100` rounded to two places, or zero when
/// `whole` is zero.
#[must_use]
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}
