//! Report repository: cached trial balances and account reconciliation.
//!
//! Reports are computed from the journal on demand. Trial balances are
//! cached per `(as_of, include_zero_balance)`; postings drop every cached
//! report whose `as_of` is on or after the earliest date they touch, and
//! chart changes drop them all.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use hisab_core::reports::{ReconciliationReport, ReportError, ReportService, TrialBalanceReport};
use tracing::{debug, info, warn};

use crate::database::{Database, TrialBalanceKey};

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: Database,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Trial balance as of `as_of`, served from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if an entry references a chart account
    /// missing from the chart.
    pub async fn trial_balance(
        &self,
        as_of: NaiveDate,
        include_zero_balance: bool,
    ) -> Result<TrialBalanceReport, ReportError> {
        let key = TrialBalanceKey {
            as_of,
            include_zero_balance,
        };
        let chart = self.db.chart().read().await;
        if let Some(cached) = self.db.trial_balances().get(&key) {
            debug!(%as_of, include_zero_balance, "Trial balance served from cache");
            return Ok(cached.as_ref().clone());
        }

        let accounts = chart.sorted();
        // Held until the insert so a concurrent publish either lands before
        // the computation or invalidates after the insert.
        let journal = self.db.journal().read();
        let report =
            ReportService::trial_balance(&accounts, journal.iter(), as_of, include_zero_balance)?;
        self.db.trial_balances().insert(key, Arc::new(report.clone()));
        drop(journal);

        if !report.is_balanced {
            warn!(
                %as_of,
                total_debit = %report.total_debit,
                total_credit = %report.total_credit,
                difference = %report.difference,
                "Trial balance does not balance"
            );
        }
        debug!(%as_of, include_zero_balance, lines = report.lines.len(), "Trial balance computed");
        Ok(report)
    }

    /// Reconciles money account balances against the journal.
    ///
    /// Takes every account row lock, so the snapshot sits between postings.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if an entry references a chart account
    /// missing from the chart.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, ReportError> {
        let rows = self.db.account_rows();
        let mut guards = Vec::with_capacity(rows.len());
        for row in &rows {
            guards.push(row.lock().await);
        }
        let chart = self.db.chart().read().await;
        let accounts: Vec<_> = guards.iter().map(|account| (**account).clone()).collect();
        let chart_accounts = chart.sorted();

        let report = {
            let journal = self.db.journal().read();
            ReportService::reconcile(&chart_accounts, &accounts, journal.iter(), Utc::now())?
        };
        drop(chart);
        drop(guards);

        if report.is_reconciled {
            info!(accounts = accounts.len(), "Reconciliation passed");
        } else {
            warn!(
                mismatched_accounts = report.account_mismatches.len(),
                unlinked_accounts = report.unlinked_accounts.len(),
                total_accounts_balance = %report.total_accounts_balance,
                total_ledger_balance = %report.total_ledger_balance,
                "Reconciliation found mismatches"
            );
        }
        Ok(report)
    }
}
