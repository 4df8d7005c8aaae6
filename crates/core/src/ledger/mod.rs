//! Posting rules and the ledger entry chain.
//!
//! This module implements the core ledger functionality:
//! - Ledger entries and their double-entry view
//! - Running balances and chain verification
//! - Business rule validation
//! - Posting request and result types
//! - Error types for ledger operations
//! - Ledger service that builds entries from requests
//! - Fiscal period validation

pub mod balance;
pub mod entry;
pub mod error;
pub mod fiscal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{RunningBalance, verify_chain};
pub use entry::{EntryType, JournalLine, JournalSide, LedgerEntry};
pub use error::LedgerError;
pub use fiscal::{resolve_posting_year, validate_posting_permission};
pub use service::{LedgerService, PostingStamp};
pub use types::{DepositInput, PostingResult, TransferInput, TransferResult, WithdrawInput};
