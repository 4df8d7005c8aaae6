//! Shared in-memory tables and the commit path.
//!
//! Lock order, outermost first:
//!
//! 1. account rows, ascending by id
//! 2. fiscal years (read for postings, write for close/reopen)
//! 3. chart of accounts
//! 4. budget recalculation, then the journal
//!
//! Postings hold 1-3 from validation until the new entries are published,
//! so a fiscal year cannot close and a classification cannot change between
//! the check and the commit.
//!
//! Readers never wait on a row lock: each account's last published state is
//! kept beside the journal and replaced together with it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use dashmap::{DashMap, DashSet};
use hisab_core::account::Account;
use hisab_core::budget::{AllocationRecord, Budget, CostCenter};
use hisab_core::chart::{ChartOfAccount, ChartUsage};
use hisab_core::fiscal::FiscalYear;
use hisab_core::ledger::{LedgerEntry, LedgerError, PostingStamp};
use hisab_core::reports::TrialBalanceReport;
use hisab_shared::{AppConfig, DomainError};
use hisab_shared::types::{
    AccountId, BudgetId, ChartAccountId, CostCenterId, FiscalYearId, IdempotencyKey,
};
use moka::sync::Cache;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::commit_log::{CommitBatch, CommitLog, InMemoryCommitLog};
use crate::idempotency::IdempotencyStore;

/// Cache key of a trial balance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TrialBalanceKey {
    pub as_of: NaiveDate,
    pub include_zero_balance: bool,
}

/// Chart of accounts indexed by id and by code.
#[derive(Debug, Default)]
pub(crate) struct ChartTable {
    by_id: HashMap<ChartAccountId, ChartOfAccount>,
    by_code: BTreeMap<String, ChartAccountId>,
    referenced: DashSet<ChartAccountId>,
    linked: DashSet<ChartAccountId>,
}

impl ChartTable {
    pub fn get(&self, id: ChartAccountId) -> Option<&ChartOfAccount> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: ChartAccountId) -> Option<&mut ChartOfAccount> {
        self.by_id.get_mut(&id)
    }

    pub fn get_by_code(&self, code: &str) -> Option<&ChartOfAccount> {
        self.by_code.get(code.trim()).and_then(|id| self.by_id.get(id))
    }

    pub fn insert(&mut self, account: ChartOfAccount) -> Result<(), LedgerError> {
        if self.by_code.contains_key(&account.code) {
            return Err(LedgerError::DuplicateCode(account.code));
        }
        self.by_code.insert(account.code.clone(), account.id);
        self.by_id.insert(account.id, account);
        Ok(())
    }

    /// Every chart account, ordered by code.
    pub fn sorted(&self) -> Vec<ChartOfAccount> {
        self.by_code
            .values()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    pub fn is_referenced(&self, id: ChartAccountId) -> bool {
        self.referenced.contains(&id)
    }

    pub fn usage(&self, id: ChartAccountId) -> ChartUsage {
        if self.referenced.contains(&id) {
            ChartUsage::Posted
        } else if self.linked.contains(&id) {
            ChartUsage::Linked
        } else {
            ChartUsage::Unused
        }
    }

    /// Records that a money account or a budget depends on `id`.
    ///
    /// Callable under a read guard, like `mark_referenced`.
    pub fn mark_linked(&self, id: ChartAccountId) {
        self.linked.insert(id);
    }

    /// Marks every chart account an entry posts to as referenced.
    ///
    /// Callable under a read guard; writers check the set under the write
    /// guard, after every in-flight posting has published.
    pub fn mark_referenced<'a>(&self, entries: impl IntoIterator<Item = &'a LedgerEntry>) {
        for line in entries.into_iter().flat_map(LedgerEntry::journal_lines) {
            self.referenced.insert(line.chart_account_id);
        }
    }
}

/// Handle to the store. Cheap to clone; every clone sees the same tables.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Tables>,
}

struct Tables {
    config: AppConfig,
    commit_log: Arc<dyn CommitLog>,
    accounts: DashMap<AccountId, Arc<Mutex<Account>>>,
    published: DashMap<AccountId, Account>,
    fiscal_years: RwLock<Vec<FiscalYear>>,
    chart: RwLock<ChartTable>,
    journal: parking_lot::RwLock<Vec<LedgerEntry>>,
    sequence: AtomicU64,
    idempotency: IdempotencyStore,
    budgets: DashMap<BudgetId, Budget>,
    cost_centers: DashMap<CostCenterId, CostCenter>,
    cost_center_codes: DashMap<String, CostCenterId>,
    allocations: parking_lot::RwLock<Vec<AllocationRecord>>,
    recalculation: parking_lot::Mutex<()>,
    trial_balances: Cache<TrialBalanceKey, Arc<TrialBalanceReport>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("accounts", &self.inner.accounts.len())
            .field("entries", &self.inner.journal.read().len())
            .field("sequence", &self.inner.sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates an empty store backed by an in-memory commit log.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self::with_commit_log(config, Arc::new(InMemoryCommitLog::new()))
    }

    /// Creates an empty store that makes commits durable through `commit_log`.
    #[must_use]
    pub fn with_commit_log(config: AppConfig, commit_log: Arc<dyn CommitLog>) -> Self {
        let trial_balances = Cache::builder()
            .max_capacity(config.reports.trial_balance_cache_capacity)
            .time_to_live(Duration::from_secs(
                config.reports.trial_balance_cache_ttl_secs,
            ))
            .support_invalidation_closures()
            .build();
        let idempotency = IdempotencyStore::new(
            config.ledger.idempotency_key_capacity,
            Duration::from_secs(config.ledger.idempotency_key_ttl_secs),
        );

        Self {
            inner: Arc::new(Tables {
                config,
                commit_log,
                accounts: DashMap::new(),
                published: DashMap::new(),
                fiscal_years: RwLock::new(Vec::new()),
                chart: RwLock::new(ChartTable::default()),
                journal: parking_lot::RwLock::new(Vec::new()),
                sequence: AtomicU64::new(0),
                idempotency,
                budgets: DashMap::new(),
                cost_centers: DashMap::new(),
                cost_center_codes: DashMap::new(),
                allocations: parking_lot::RwLock::new(Vec::new()),
                recalculation: parking_lot::Mutex::new(()),
                trial_balances,
            }),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Number of entries in the journal.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.journal.read().len()
    }

    /// Last sequence handed out. Rejected postings leave gaps.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::SeqCst)
    }

    /// Registers a new account's row lock and its first published state.
    pub(crate) fn insert_account(&self, account: &Account) {
        self.inner.published.insert(account.id, account.clone());
        self.inner
            .accounts
            .insert(account.id, Arc::new(Mutex::new(account.clone())));
    }

    /// Last published state of an account. Never waits on its row lock.
    pub(crate) fn published_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.inner
            .published
            .get(&id)
            .map(|account| account.clone())
            .ok_or_else(|| LedgerError::not_found("Account", id))
    }

    /// Last published state of every account.
    pub(crate) fn published_accounts(&self) -> Vec<Account> {
        self.inner
            .published
            .iter()
            .map(|account| account.value().clone())
            .collect()
    }

    /// Publishes a lifecycle change that posts no entries. Called under the
    /// account's row lock.
    pub(crate) fn publish_account(&self, account: &Account) {
        self.inner.published.insert(account.id, account.clone());
    }

    /// Row lock of an account.
    pub(crate) fn account_row(&self, id: AccountId) -> Result<Arc<Mutex<Account>>, LedgerError> {
        self.inner
            .accounts
            .get(&id)
            .map(|row| Arc::clone(row.value()))
            .ok_or_else(|| LedgerError::not_found("Account", id))
    }

    /// Every account row, ascending by id (the lock order).
    pub(crate) fn account_rows(&self) -> Vec<Arc<Mutex<Account>>> {
        let mut rows: Vec<(AccountId, Arc<Mutex<Account>>)> = self
            .inner
            .accounts
            .iter()
            .map(|row| (*row.key(), Arc::clone(row.value())))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    pub(crate) fn fiscal_years(&self) -> &RwLock<Vec<FiscalYear>> {
        &self.inner.fiscal_years
    }

    pub(crate) fn chart(&self) -> &RwLock<ChartTable> {
        &self.inner.chart
    }

    pub(crate) fn journal(&self) -> &parking_lot::RwLock<Vec<LedgerEntry>> {
        &self.inner.journal
    }

    pub(crate) fn idempotency(&self) -> &IdempotencyStore {
        &self.inner.idempotency
    }

    pub(crate) fn budgets(&self) -> &DashMap<BudgetId, Budget> {
        &self.inner.budgets
    }

    pub(crate) fn cost_centers(&self) -> &DashMap<CostCenterId, CostCenter> {
        &self.inner.cost_centers
    }

    pub(crate) fn cost_center_codes(&self) -> &DashMap<String, CostCenterId> {
        &self.inner.cost_center_codes
    }

    pub(crate) fn allocations(&self) -> &parking_lot::RwLock<Vec<AllocationRecord>> {
        &self.inner.allocations
    }

    /// Serializes budget and cost-center recomputation.
    pub(crate) fn recalculation(&self) -> &parking_lot::Mutex<()> {
        &self.inner.recalculation
    }

    pub(crate) fn trial_balances(&self) -> &Cache<TrialBalanceKey, Arc<TrialBalanceReport>> {
        &self.inner.trial_balances
    }

    /// Reserves `legs` consecutive sequences and stamps a posting with them.
    pub(crate) fn stamp(&self, legs: u64, fiscal_year_id: FiscalYearId) -> PostingStamp {
        let sequence = self.inner.sequence.fetch_add(legs, Ordering::SeqCst) + 1;
        PostingStamp {
            sequence,
            fiscal_year_id,
            created_at: Utc::now(),
        }
    }

    /// Appends one posting to the commit log, retrying transient failures.
    ///
    /// Nothing is applied to the tables here; callers publish only after
    /// this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` once every attempt has failed.
    pub(crate) async fn commit(
        &self,
        idempotency_key: Option<IdempotencyKey>,
        entries: &[LedgerEntry],
    ) -> Result<(), LedgerError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        let batch = CommitBatch {
            sequence: first.sequence,
            idempotency_key,
            entries: entries.to_vec(),
            committed_at: first.created_at,
        };

        let ledger = &self.inner.config.ledger;
        let attempts = ledger.commit_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.commit_log.append(&batch).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    warn!(
                        sequence = batch.sequence,
                        attempt,
                        error = %err,
                        "Commit log append failed, retrying"
                    );
                    let backoff = ledger.commit_backoff_ms.saturating_mul(u64::from(attempt));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        sequence = batch.sequence,
                        attempt,
                        error = %err,
                        "Commit log append failed, abandoning posting"
                    );
                    return Err(err.into());
                }
            }
        }
    }

    /// Makes committed entries and the accounts they moved visible to
    /// readers in one step, and drops every cached report they change.
    pub(crate) fn publish(
        &self,
        chart: &ChartTable,
        accounts: &[&Account],
        entries: &[LedgerEntry],
    ) {
        chart.mark_referenced(entries);
        let mut journal = self.inner.journal.write();
        journal.extend_from_slice(entries);
        for account in accounts {
            self.inner.published.insert(account.id, (*account).clone());
        }
        if let Some(earliest) = entries.iter().map(|entry| entry.transaction_date).min() {
            self.invalidate_reports_from(earliest);
        }
    }

    /// Drops cached reports with `as_of >= date`.
    fn invalidate_reports_from(&self, date: NaiveDate) {
        let cache = &self.inner.trial_balances;
        if let Err(err) = cache.invalidate_entries_if(move |key, _| key.as_of >= date) {
            warn!(error = ?err, "Selective report invalidation failed, clearing cache");
            cache.invalidate_all();
        }
    }

    /// Drops every cached report. Called under the chart write guard.
    pub(crate) fn invalidate_all_reports(&self) {
        self.inner.trial_balances.invalidate_all();
    }
}
