//! Repositories over the shared tables.
//!
//! Every repository wraps a cloned [`Database`](crate::Database) handle;
//! they are cheap to construct and can be used from many tasks at once.

pub mod account;
pub mod budget;
pub mod chart;
pub mod fiscal;
pub mod ledger;
pub mod report;

pub use account::AccountRepository;
pub use budget::{AllocatedEntity, AllocationResult, BudgetRepository};
pub use chart::ChartRepository;
pub use fiscal::FiscalRepository;
pub use ledger::LedgerRepository;
pub use report::ReportRepository;
