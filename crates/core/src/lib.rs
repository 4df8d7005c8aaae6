//! Core business logic for Hisab.
//!
//! This crate contains pure business logic with ZERO storage or web dependencies.
//! All domain types, validation rules, and calculations live here; the `db`
//! crate owns locking and persistence and calls into these functions.
//!
//! # Modules
//!
//! - `account` - Money accounts (cash, bank, mobile wallets) and their lifecycle
//! - `chart` - Chart of accounts classification
//! - `ledger` - Posting rules, ledger entries, and the balance chain
//! - `fiscal` - Fiscal year lifecycle (open, closed, reopened)
//! - `budget` - Budget and cost-center tracking against actual spend
//! - `reports` - Trial balance and account reconciliation

pub mod account;
pub mod budget;
pub mod chart;
pub mod fiscal;
pub mod ledger;
pub mod reports;
