//! Money account repository.
//!
//! Balances are only ever changed by the posting engine; this repository
//! creates accounts, reads them, and manages their lifecycle. Reads see the
//! last published state and never queue behind an in-flight posting.

use chrono::Utc;
use hisab_core::account::{Account, AccountWithEntries, CreateAccountInput};
use hisab_core::ledger::{LedgerEntry, LedgerError, verify_chain};
use hisab_shared::types::{AccountId, PageRequest, PageResponse};
use tracing::{error, info};

use crate::database::Database;

/// Money account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Database,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a zero-balance account rolled up to an asset chart account.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the chart account does not exist
    /// - `InvalidClassification` if it is not an active asset account
    /// - `InvalidInput` for an empty name or negative overdraft limit
    pub async fn create(&self, input: CreateAccountInput) -> Result<Account, LedgerError> {
        let chart = self.db.chart().read().await;
        let chart_account = chart
            .get(input.chart_account_id)
            .ok_or_else(|| LedgerError::not_found("Chart account", input.chart_account_id))?;
        let account = Account::new(input, chart_account, Utc::now())?;
        chart.mark_linked(account.chart_account_id);
        self.db.insert_account(&account);

        info!(
            account_id = %account.id,
            name = %account.name,
            chart_account_id = %account.chart_account_id,
            "Account created"
        );
        Ok(account)
    }

    /// Gets an account, optionally with its most recent entries (newest
    /// first, up to the configured limit).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub fn get(
        &self,
        id: AccountId,
        include_recent: bool,
    ) -> Result<AccountWithEntries, LedgerError> {
        let journal = self.db.journal().read();
        let account = self.db.published_account(id)?;
        let recent_entries = if include_recent {
            let limit = self.db.config().ledger.recent_entries_limit;
            let mut entries = entries_of(&journal, id);
            entries.reverse();
            entries.truncate(limit);
            entries
        } else {
            Vec::new()
        };
        Ok(AccountWithEntries {
            account,
            recent_entries,
        })
    }

    /// Lists every account ordered by name.
    pub fn list(&self) -> Vec<Account> {
        let mut accounts = self.db.published_accounts();
        accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        accounts
    }

    /// Lists an account's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub fn list_entries(
        &self,
        id: AccountId,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        let mut entries = {
            let journal = self.db.journal().read();
            self.db.published_account(id)?;
            entries_of(&journal, id)
        };
        entries.reverse();
        Ok(PageResponse::paginate(entries, page))
    }

    /// Soft-deletes an account.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `NonZeroBalance` while it holds money
    /// - `InvalidStatusTransition` if it is already inactive
    pub async fn deactivate(&self, id: AccountId) -> Result<Account, LedgerError> {
        let row = self.db.account_row(id)?;
        let mut account = row.lock().await;
        account.deactivate(Utc::now())?;
        self.db.publish_account(&account);

        info!(account_id = %id, "Account deactivated");
        Ok(account.clone())
    }

    /// Reactivates an inactive account.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidStatusTransition` if it is already active.
    pub async fn reactivate(&self, id: AccountId) -> Result<Account, LedgerError> {
        let row = self.db.account_row(id)?;
        let mut account = row.lock().await;
        account.reactivate(Utc::now())?;
        self.db.publish_account(&account);

        info!(account_id = %id, "Account reactivated");
        Ok(account.clone())
    }

    /// Re-walks an account's balance chain.
    ///
    /// The chain must be contiguous, and its last balance and length must
    /// match the account's stored balance and entry count.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `ChainBroken` at the first inconsistency.
    pub async fn verify_integrity(&self, id: AccountId) -> Result<(), LedgerError> {
        let row = self.db.account_row(id)?;
        let account = row.lock().await;
        let entries = entries_of(&self.db.journal().read(), id);

        let result = verify_chain(id, &entries).and_then(|balance| {
            let last_sequence = entries.last().map_or(0, |entry| entry.sequence);
            if balance != account.current_balance || entries.len() as u64 != account.entry_count {
                return Err(LedgerError::ChainBroken {
                    account_id: id,
                    sequence: last_sequence,
                    expected: balance,
                    actual: account.current_balance,
                });
            }
            Ok(())
        });
        if let Err(err) = &result {
            error!(account_id = %id, error = %err, "Balance chain verification failed");
        }
        result
    }
}

/// An account's entries in sequence order.
fn entries_of(journal: &[LedgerEntry], id: AccountId) -> Vec<LedgerEntry> {
    let mut entries: Vec<LedgerEntry> = journal
        .iter()
        .filter(|entry| entry.account_id == id)
        .cloned()
        .collect();
    entries.sort_by_key(|entry| entry.sequence);
    entries
}
