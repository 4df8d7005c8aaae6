//! Fiscal year repository.
//!
//! Close and reopen take the fiscal write lock, which waits for every
//! posting that has already validated its date against the year.

use chrono::{NaiveDate, Utc};
use hisab_core::fiscal::{CreateFiscalYearInput, FiscalError, FiscalYear, find_for_date};
use hisab_shared::types::{FiscalYearId, UserId};
use tracing::info;

use crate::database::Database;

/// Fiscal year repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: Database,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an open fiscal year.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty name
    /// - `InvalidDateRange` when start is not before end
    /// - `OverlappingYear` when the range intersects an existing year
    pub async fn create(&self, input: CreateFiscalYearInput) -> Result<FiscalYear, FiscalError> {
        let mut years = self.db.fiscal_years().write().await;
        let year = FiscalYear::new(input, &years, Utc::now())?;
        years.push(year.clone());
        years.sort_by_key(|y| y.start_date);

        info!(
            fiscal_year_id = %year.id,
            name = %year.name,
            start_date = %year.start_date,
            end_date = %year.end_date,
            "Fiscal year created"
        );
        Ok(year)
    }

    /// Gets a fiscal year by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn get(&self, id: FiscalYearId) -> Result<FiscalYear, FiscalError> {
        self.db
            .fiscal_years()
            .read()
            .await
            .iter()
            .find(|year| year.id == id)
            .cloned()
            .ok_or(FiscalError::NotFound(id))
    }

    /// Lists every fiscal year ordered by start date.
    pub async fn list(&self) -> Vec<FiscalYear> {
        self.db.fiscal_years().read().await.clone()
    }

    /// Finds the fiscal year covering `date`, whatever its status.
    pub async fn find_for_date(&self, date: NaiveDate) -> Option<FiscalYear> {
        let years = self.db.fiscal_years().read().await;
        find_for_date(&years, date).cloned()
    }

    /// Closes a fiscal year; postings dated inside it are rejected from now on.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `AlreadyClosed` if it is closed.
    pub async fn close(&self, id: FiscalYearId) -> Result<FiscalYear, FiscalError> {
        let mut years = self.db.fiscal_years().write().await;
        let year = years
            .iter_mut()
            .find(|year| year.id == id)
            .ok_or(FiscalError::NotFound(id))?;
        year.close(Utc::now())?;

        info!(fiscal_year_id = %id, name = %year.name, "Fiscal year closed");
        Ok(year.clone())
    }

    /// Reopens a closed fiscal year. Privileged; entries already posted are
    /// not revalidated.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `NotClosed` if it is not closed.
    pub async fn reopen(
        &self,
        id: FiscalYearId,
        reopened_by: Option<UserId>,
    ) -> Result<FiscalYear, FiscalError> {
        let mut years = self.db.fiscal_years().write().await;
        let year = years
            .iter_mut()
            .find(|year| year.id == id)
            .ok_or(FiscalError::NotFound(id))?;
        year.reopen(Utc::now(), reopened_by)?;

        info!(
            fiscal_year_id = %id,
            name = %year.name,
            reopened_by = ?reopened_by,
            "Fiscal year reopened"
        );
        Ok(year.clone())
    }
}
