//! Fiscal year management.

pub mod error;
pub mod year;

pub use error::FiscalError;
pub use year::{
    CreateFiscalYearInput, FiscalYear, FiscalYearStatus, date_ranges_overlap, find_for_date,
    validate_date_range,
};
