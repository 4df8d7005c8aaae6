//! Money accounts and their lifecycle.
//!
//! An `Account` exclusively owns its `current_balance`. Nothing outside the
//! posting path may change it; `Account::apply_entry` is the only mutator and
//! it refuses any entry that does not continue the balance chain.

pub mod types;

pub use types::{Account, AccountStatus, AccountType, AccountWithEntries, CreateAccountInput};
