//! Fiscal year lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use hisab_shared::types::{FiscalYearId, UserId};
use serde::{Deserialize, Serialize};

use super::error::FiscalError;

/// Lifecycle of a fiscal year.
///
/// `Open -> Closed -> Reopened -> Closed -> ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYearStatus {
    /// Created and accepting postings.
    Open,
    /// Closed; postings dated inside the year are rejected.
    Closed,
    /// Reopened after a close; accepts postings again.
    Reopened,
}

/// A bounded accounting period that can be closed to prevent postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier.
    pub id: FiscalYearId,
    /// Display name (e.g., "FY2025").
    pub name: String,
    /// First day of the year (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the year (inclusive).
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: FiscalYearStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the year was last closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the year was last reopened.
    pub reopened_at: Option<DateTime<Utc>>,
    /// Who last reopened the year.
    pub reopened_by: Option<UserId>,
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFiscalYearInput {
    /// Display name.
    pub name: String,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
}

impl FiscalYear {
    /// Builds a new open fiscal year.
    ///
    /// `existing` is every fiscal year already defined; the new range must
    /// not overlap any of them.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty name.
    /// - `InvalidDateRange` when `start_date >= end_date`.
    /// - `OverlappingYear` when the range intersects an existing year.
    pub fn new(
        input: CreateFiscalYearInput,
        existing: &[FiscalYear],
        now: DateTime<Utc>,
    ) -> Result<Self, FiscalError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(FiscalError::InvalidInput(
                "fiscal year name cannot be empty".to_string(),
            ));
        }
        validate_date_range(input.start_date, input.end_date)?;
        if let Some(overlap) = existing.iter().find(|year| {
            date_ranges_overlap(year.start_date, year.end_date, input.start_date, input.end_date)
        }) {
            return Err(FiscalError::OverlappingYear {
                existing: overlap.id,
            });
        }

        Ok(Self {
            id: FiscalYearId::new(),
            name: name.to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            status: FiscalYearStatus::Open,
            created_at: now,
            closed_at: None,
            reopened_at: None,
            reopened_by: None,
        })
    }

    /// Returns true if the year accepts postings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_closed()
    }

    /// Returns true if the year is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == FiscalYearStatus::Closed
    }

    /// Returns true if `date` falls within `[start_date, end_date]`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Closes the year.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the year is closed.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), FiscalError> {
        if self.is_closed() {
            return Err(FiscalError::AlreadyClosed(self.id));
        }
        self.status = FiscalYearStatus::Closed;
        self.closed_at = Some(now);
        Ok(())
    }

    /// Reopens a closed year. Already-posted entries are not revalidated.
    ///
    /// # Errors
    ///
    /// Returns `NotClosed` if the year is not closed.
    pub fn reopen(&mut self, now: DateTime<Utc>, by: Option<UserId>) -> Result<(), FiscalError> {
        if !self.is_closed() {
            return Err(FiscalError::NotClosed(self.id));
        }
        self.status = FiscalYearStatus::Reopened;
        self.reopened_at = Some(now);
        self.reopened_by = by;
        Ok(())
    }
}

/// Validates that `start` is strictly before `end`.
///
/// # Errors
///
/// Returns `InvalidDateRange` otherwise.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FiscalError> {
    if start >= end {
        return Err(FiscalError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Returns true if two inclusive date ranges share at least one day.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Finds the fiscal year containing `date`.
#[must_use]
pub fn find_for_date(years: &[FiscalYear], date: NaiveDate) -> Option<&FiscalYear> {
    years.iter().find(|year| year.contains(date))
}
