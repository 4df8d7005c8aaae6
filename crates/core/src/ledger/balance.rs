//! Running balances and balance-chain verification.

use hisab_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;
use super::error::LedgerError;

/// Running balance information for a ledger entry.
///
/// - `entry_count`: per-account version, increases by exactly one per entry
/// - `balance_before`: balance before this entry
/// - `balance_after`: balance after this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Per-account version after this entry.
    pub entry_count: u64,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
}

impl RunningBalance {
    /// Running balance that continues from a stored balance and version.
    ///
    /// `balance_before[N] = balance_after[N-1]` and
    /// `balance_after[N] = balance_before[N] + change`.
    #[must_use]
    pub fn continue_from(entry_count: u64, balance: Decimal, balance_change: Decimal) -> Self {
        Self {
            entry_count: entry_count + 1,
            balance_before: balance,
            balance_after: balance + balance_change,
        }
    }
}

/// Walks an account's entries in sequence order and checks the chain.
///
/// Returns the final balance. Checks, for every entry:
/// - it belongs to `account_id`
/// - sequences strictly increase
/// - `balance_before` equals the previous `balance_after` (zero for the first)
/// - `balance_after = balance_before + signed_amount`
///
/// # Errors
///
/// Returns `LedgerError::ChainBroken` at the first violation.
pub fn verify_chain(
    account_id: AccountId,
    entries: &[LedgerEntry],
) -> Result<Decimal, LedgerError> {
    let mut balance = Decimal::ZERO;
    let mut last_sequence: Option<u64> = None;

    for entry in entries {
        let broken = |expected: Decimal, actual: Decimal| LedgerError::ChainBroken {
            account_id,
            sequence: entry.sequence,
            expected,
            actual,
        };

        if entry.account_id != account_id {
            return Err(broken(balance, entry.balance_before));
        }
        if last_sequence.is_some_and(|last| entry.sequence <= last) {
            return Err(broken(balance, entry.balance_before));
        }
        if entry.balance_before != balance {
            return Err(broken(balance, entry.balance_before));
        }
        let expected_after = entry.balance_before + entry.signed_amount();
        if entry.balance_after != expected_after {
            return Err(broken(expected_after, entry.balance_after));
        }

        balance = entry.balance_after;
        last_sequence = Some(entry.sequence);
    }

    Ok(balance)
}
