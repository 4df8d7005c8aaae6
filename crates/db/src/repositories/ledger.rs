//! Posting engine: deposits, withdrawals and transfers.
//!
//! Each posting runs the same steps:
//!
//! 1. claim the idempotency key (replay or conflict ends here)
//! 2. lock the account rows in id order
//! 3. resolve the fiscal year and the classification under their read locks
//! 4. build the entries against the locked balances
//! 5. append the batch to the commit log
//! 6. publish the entries and the new balances, then release the locks
//! 7. refresh budgets and cost centers
//!
//! Every failure before step 6 leaves the tables untouched.

use std::future::Future;

use hisab_core::account::Account;
use hisab_core::chart::ChartOfAccount;
use hisab_core::ledger::{
    DepositInput, LedgerEntry, LedgerError, LedgerService, PostingResult, TransferInput,
    TransferResult, WithdrawInput, resolve_posting_year,
};
use hisab_core::ledger::validation::validate_amount;
use hisab_shared::types::{ChartAccountId, IdempotencyKey};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::{ChartTable, Database};
use crate::idempotency::{Claim, fingerprint};
use crate::repositories::budget::refresh_after_posting;

/// Posting engine.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: Database,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Deposits money into an account.
    ///
    /// Credits the given classification, or the configured default deposit
    /// account when none is given.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive or over-precise amount
    /// - `NotFound` for an unknown account
    /// - `NoFiscalYear` / `PeriodClosed` for the transaction date
    /// - `AccountInactive` if the account is inactive
    /// - `InvalidClassification` / `MissingDefaultClassification`
    /// - `IdempotencyConflict` if the key was used for another request
    /// - `PersistenceFailure` if the commit log stays unavailable
    pub async fn deposit(&self, input: DepositInput) -> Result<LedgerEntry, LedgerError> {
        let key = input.idempotency_key.clone();
        let result = self
            .idempotent("deposit", key.as_ref(), &input, || self.post_deposit(&input))
            .await
            .inspect_err(|err| rejected("deposit", err))?;
        single_entry(result, key)
    }

    /// Spends money from an account against an expense account.
    ///
    /// # Errors
    ///
    /// As `deposit`, plus `InsufficientBalance` when the amount with tax
    /// exceeds balance plus overdraft, and `NotFound` for an unknown cost
    /// center.
    pub async fn withdraw(&self, input: WithdrawInput) -> Result<LedgerEntry, LedgerError> {
        let key = input.idempotency_key.clone();
        let result = self
            .idempotent("withdraw", key.as_ref(), &input, || self.post_withdrawal(&input))
            .await
            .inspect_err(|err| rejected("withdraw", err))?;
        let entry = single_entry(result, key)?;
        refresh_after_posting(&self.db, &entry);
        Ok(entry)
    }

    /// Moves money between two accounts atomically.
    ///
    /// # Errors
    ///
    /// `SameAccount`, `InvalidAmount`, `NotFound`, `NoFiscalYear`,
    /// `PeriodClosed`, `AccountInactive`, `InsufficientBalance`,
    /// `IdempotencyConflict`, or `PersistenceFailure`.
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferResult, LedgerError> {
        let key = input.idempotency_key.clone();
        let result = self
            .idempotent("transfer", key.as_ref(), &input, || self.post_transfer(&input))
            .await
            .inspect_err(|err| rejected("transfer", err))?;
        match result {
            PostingResult::Transfer { result } => Ok(result),
            PostingResult::Single { .. } => Err(mismatched(key)),
        }
    }

    /// Runs `post` at most once per idempotency key and payload.
    async fn idempotent<T, F, Fut>(
        &self,
        operation: &str,
        key: Option<&IdempotencyKey>,
        payload: &T,
        post: F,
    ) -> Result<PostingResult, LedgerError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PostingResult, LedgerError>>,
    {
        let Some(key) = key else {
            return post().await;
        };
        let reservation = match self
            .db
            .idempotency()
            .claim(key, fingerprint(operation, payload)?)?
        {
            Claim::Replay(result) => {
                debug!(idempotency_key = %key, operation, "Replaying committed posting");
                return Ok(result);
            }
            Claim::Reserved(reservation) => reservation,
        };

        let result = post().await?;
        reservation.complete(&result);
        Ok(result)
    }

    async fn post_deposit(&self, input: &DepositInput) -> Result<PostingResult, LedgerError> {
        let ledger = &self.db.config().ledger;
        validate_amount(input.amount, ledger.amount_scale)?;

        let row = self.db.account_row(input.account_id)?;
        let mut account = row.lock().await;
        let years = self.db.fiscal_years().read().await;
        let fiscal_year_id = resolve_posting_year(&years, input.transaction_date)?;
        let chart = self.db.chart().read().await;
        let credited = match input.chart_account_id {
            Some(id) => classification(&chart, id)?,
            None => chart
                .get_by_code(&ledger.default_deposit_account_code)
                .ok_or_else(|| {
                    LedgerError::MissingDefaultClassification(
                        ledger.default_deposit_account_code.clone(),
                    )
                })?,
        };

        let stamp = self.db.stamp(1, fiscal_year_id);
        let entry = LedgerService::build_deposit(
            &account,
            credited,
            input,
            ledger.amount_scale,
            stamp,
        )?;
        let next = advanced(&account, &entry)?;

        self.db
            .commit(input.idempotency_key.clone(), std::slice::from_ref(&entry))
            .await?;
        *account = next;
        self.db.publish(&chart, &[&*account], std::slice::from_ref(&entry));

        info!(
            entry_id = %entry.id,
            sequence = entry.sequence,
            account_id = %entry.account_id,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "Deposit posted"
        );
        Ok(PostingResult::Single { entry })
    }

    async fn post_withdrawal(&self, input: &WithdrawInput) -> Result<PostingResult, LedgerError> {
        let ledger = &self.db.config().ledger;
        validate_amount(input.amount, ledger.amount_scale)?;
        LedgerService::withdrawal_total(input.amount, input.tax_percent, ledger.amount_scale)?;

        let row = self.db.account_row(input.account_id)?;
        let mut account = row.lock().await;
        let years = self.db.fiscal_years().read().await;
        let fiscal_year_id = resolve_posting_year(&years, input.transaction_date)?;
        let chart = self.db.chart().read().await;
        let expense = classification(&chart, input.chart_account_id)?;
        if let Some(cost_center_id) = input.cost_center_id {
            if !self.db.cost_centers().contains_key(&cost_center_id) {
                return Err(LedgerError::not_found("Cost center", cost_center_id));
            }
        }

        let stamp = self.db.stamp(1, fiscal_year_id);
        let entry =
            LedgerService::build_withdrawal(&account, expense, input, ledger.amount_scale, stamp)?;
        let next = advanced(&account, &entry)?;

        self.db
            .commit(input.idempotency_key.clone(), std::slice::from_ref(&entry))
            .await?;
        *account = next;
        self.db.publish(&chart, &[&*account], std::slice::from_ref(&entry));

        info!(
            entry_id = %entry.id,
            sequence = entry.sequence,
            account_id = %entry.account_id,
            chart_account_id = %input.chart_account_id,
            amount = %entry.amount,
            tax_amount = %entry.tax_amount,
            balance_after = %entry.balance_after,
            "Withdrawal posted"
        );
        Ok(PostingResult::Single { entry })
    }

    async fn post_transfer(&self, input: &TransferInput) -> Result<PostingResult, LedgerError> {
        let ledger = &self.db.config().ledger;
        LedgerService::precheck_transfer(input, ledger.amount_scale)?;

        let from_row = self.db.account_row(input.from_account_id)?;
        let to_row = self.db.account_row(input.to_account_id)?;
        let (mut from, mut to) = if input.from_account_id < input.to_account_id {
            let from = from_row.lock().await;
            let to = to_row.lock().await;
            (from, to)
        } else {
            let to = to_row.lock().await;
            let from = from_row.lock().await;
            (from, to)
        };
        let years = self.db.fiscal_years().read().await;
        let fiscal_year_id = resolve_posting_year(&years, input.transaction_date)?;
        let chart = self.db.chart().read().await;

        let stamp = self.db.stamp(2, fiscal_year_id);
        let result =
            LedgerService::build_transfer(&from, &to, input, ledger.amount_scale, stamp)?;
        let next_from = advanced(&from, &result.out_entry)?;
        let next_to = advanced(&to, &result.in_entry)?;
        let entries = [result.out_entry.clone(), result.in_entry.clone()];

        self.db.commit(input.idempotency_key.clone(), &entries).await?;
        *from = next_from;
        *to = next_to;
        self.db.publish(&chart, &[&*from, &*to], &entries);

        info!(
            out_entry_id = %result.out_entry.id,
            in_entry_id = %result.in_entry.id,
            sequence = result.out_entry.sequence,
            from_account_id = %input.from_account_id,
            to_account_id = %input.to_account_id,
            amount = %input.amount,
            "Transfer posted"
        );
        Ok(PostingResult::Transfer { result })
    }
}

/// Looks up a classification chart account. Unknown ids are a
/// classification error, not a missing resource.
fn classification(chart: &ChartTable, id: ChartAccountId) -> Result<&ChartOfAccount, LedgerError> {
    chart
        .get(id)
        .ok_or_else(|| LedgerError::InvalidClassification {
            chart_account_id: id,
            reason: "chart account does not exist".to_string(),
        })
}

/// The account as it will be once `entry` is applied.
fn advanced(account: &Account, entry: &LedgerEntry) -> Result<Account, LedgerError> {
    let mut next = account.clone();
    next.apply_entry(entry)?;
    Ok(next)
}

fn single_entry(
    result: PostingResult,
    key: Option<IdempotencyKey>,
) -> Result<LedgerEntry, LedgerError> {
    match result {
        PostingResult::Single { entry } => Ok(entry),
        PostingResult::Transfer { .. } => Err(mismatched(key)),
    }
}

fn mismatched(key: Option<IdempotencyKey>) -> LedgerError {
    match key {
        Some(key) => LedgerError::IdempotencyConflict(key),
        None => LedgerError::ConcurrentModification,
    }
}

fn rejected(operation: &str, err: &LedgerError) {
    warn!(operation, error = %err, "Posting rejected");
}
