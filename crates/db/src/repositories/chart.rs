//! Chart of accounts repository.

use chrono::Utc;
use hisab_core::chart::{
    ChartAccountStatus, ChartOfAccount, CreateChartAccountInput, UpdateChartAccountInput,
};
use hisab_core::ledger::LedgerError;
use hisab_shared::types::ChartAccountId;
use tracing::info;

use crate::database::Database;

/// Chart of accounts repository.
#[derive(Debug, Clone)]
pub struct ChartRepository {
    db: Database,
}

impl ChartRepository {
    /// Creates a new chart repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a chart account.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed code or empty name
    /// - `DuplicateCode` if the code is taken
    pub async fn create(
        &self,
        input: CreateChartAccountInput,
    ) -> Result<ChartOfAccount, LedgerError> {
        let account = ChartOfAccount::new(input, Utc::now())?;
        let mut chart = self.db.chart().write().await;
        chart.insert(account.clone())?;
        self.db.invalidate_all_reports();

        info!(
            chart_account_id = %account.id,
            code = %account.code,
            account_type = %account.account_type,
            "Chart account created"
        );
        Ok(account)
    }

    /// Gets a chart account by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn get(&self, id: ChartAccountId) -> Result<ChartOfAccount, LedgerError> {
        self.db
            .chart()
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("Chart account", id))
    }

    /// Gets a chart account by code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has that code.
    pub async fn get_by_code(&self, code: &str) -> Result<ChartOfAccount, LedgerError> {
        self.db
            .chart()
            .read()
            .await
            .get_by_code(code)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("Chart account", code))
    }

    /// Lists every chart account ordered by code.
    pub async fn list(&self) -> Vec<ChartOfAccount> {
        self.db.chart().read().await.sorted()
    }

    /// Returns true once a posted entry references the account.
    pub async fn is_referenced(&self, id: ChartAccountId) -> bool {
        self.db.chart().read().await.is_referenced(id)
    }

    /// Renames or reclassifies an account.
    ///
    /// Once a money account or a budget links to it only the name may
    /// change; once an entry posts to it nothing may.
    ///
    /// # Errors
    ///
    /// - `NotFound` if it does not exist
    /// - `ChartAccountInUse` once posted against, or for a type change while
    ///   linked
    /// - `InvalidInput` for an empty name
    pub async fn update(
        &self,
        id: ChartAccountId,
        input: UpdateChartAccountInput,
    ) -> Result<ChartOfAccount, LedgerError> {
        let mut chart = self.db.chart().write().await;
        let usage = chart.usage(id);
        let account = chart
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("Chart account", id))?;
        account.apply_update(input, usage, Utc::now())?;
        let updated = account.clone();
        self.db.invalidate_all_reports();

        info!(chart_account_id = %id, "Chart account updated");
        Ok(updated)
    }

    /// Deactivates an account. It stays in reports but rejects new postings.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidStatusTransition` if already inactive.
    pub async fn deactivate(&self, id: ChartAccountId) -> Result<ChartOfAccount, LedgerError> {
        self.transition(id, ChartAccountStatus::Inactive).await
    }

    /// Reactivates an inactive account.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidStatusTransition` if already active.
    pub async fn reactivate(&self, id: ChartAccountId) -> Result<ChartOfAccount, LedgerError> {
        self.transition(id, ChartAccountStatus::Active).await
    }

    async fn transition(
        &self,
        id: ChartAccountId,
        status: ChartAccountStatus,
    ) -> Result<ChartOfAccount, LedgerError> {
        let mut chart = self.db.chart().write().await;
        let account = chart
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("Chart account", id))?;
        account.transition_to(status, Utc::now())?;
        let updated = account.clone();
        self.db.invalidate_all_reports();

        info!(chart_account_id = %id, status = %status, "Chart account status changed");
        Ok(updated)
    }
}
