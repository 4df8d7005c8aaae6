//! Durable commit log.
//!
//! Every logical posting is appended as one batch before any balance moves.
//! If the append fails the posting is abandoned, so the in-memory tables
//! never hold state the log has not accepted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hisab_core::ledger::LedgerEntry;
use hisab_shared::types::IdempotencyKey;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// One logical transaction as written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBatch {
    /// Sequence of the first entry in the batch.
    pub sequence: u64,
    /// Client idempotency key, if any.
    pub idempotency_key: Option<IdempotencyKey>,
    /// Entries in commit order; two for a transfer.
    pub entries: Vec<LedgerEntry>,
    /// Commit timestamp.
    pub committed_at: DateTime<Utc>,
}

/// Append-only sink that makes a batch durable.
///
/// Implementations must treat a repeated append of the same `sequence` as a
/// no-op, since the store retries failed appends.
#[async_trait]
pub trait CommitLog: Send + Sync {
    /// Durably appends `batch`.
    async fn append(&self, batch: &CommitBatch) -> Result<(), StorageError>;
}

/// Commit log that keeps batches in memory.
#[derive(Debug, Default)]
pub struct InMemoryCommitLog {
    batches: Mutex<Vec<CommitBatch>>,
}

impl InMemoryCommitLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every appended batch.
    #[must_use]
    pub fn batches(&self) -> Vec<CommitBatch> {
        self.batches.lock().clone()
    }

    /// Number of appended batches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.lock().is_empty()
    }
}

#[async_trait]
impl CommitLog for InMemoryCommitLog {
    async fn append(&self, batch: &CommitBatch) -> Result<(), StorageError> {
        let mut batches = self.batches.lock();
        if batches.iter().any(|b| b.sequence == batch.sequence) {
            return Ok(());
        }
        batches.push(batch.clone());
        Ok(())
    }
}
