//! Storage layer for Hisab.
//!
//! This crate provides:
//! - In-memory tables guarded by row and table locks
//! - The commit path: append-only commit log with retries
//! - Idempotency key tracking for postings
//! - Repositories for accounts, the chart, postings, fiscal years,
//!   budgets and reports

pub mod commit_log;
pub mod database;
pub mod error;
pub mod idempotency;
pub mod repositories;

pub use commit_log::{CommitBatch, CommitLog, InMemoryCommitLog};
pub use database::Database;
pub use error::StorageError;
pub use repositories::{
    AccountRepository, AllocatedEntity, AllocationResult, BudgetRepository, ChartRepository,
    FiscalRepository, LedgerRepository, ReportRepository,
};
