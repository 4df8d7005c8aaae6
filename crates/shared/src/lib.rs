//! Shared types, errors, and configuration for Hisab.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Money helpers with fixed-point decimal precision
//! - Pagination types and the canonical list envelope
//! - The error envelope contract every domain error maps into
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, ReportConfig};
pub use error::{DomainError, ErrorBody};
