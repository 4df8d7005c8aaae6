//! Idempotency key bookkeeping.
//!
//! A key is reserved before a posting starts and either completed with the
//! posting's result or released if the posting fails, so a failed attempt
//! can be retried with the same key. Completed keys are remembered for a
//! bounded time and count; after that the key is accepted as new.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hisab_core::ledger::{LedgerError, PostingResult};
use hisab_shared::types::IdempotencyKey;
use moka::sync::Cache;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug)]
struct CompletedKey {
    fingerprint: String,
    result: PostingResult,
}

/// Idempotency keys in flight, plus recently completed ones.
#[derive(Debug)]
pub(crate) struct IdempotencyStore {
    in_flight: Arc<DashMap<IdempotencyKey, String>>,
    completed: Cache<IdempotencyKey, Arc<CompletedKey>>,
}

/// Outcome of claiming a key.
pub(crate) enum Claim {
    /// First use: run the posting and complete the reservation.
    Reserved(Reservation),
    /// Same key and payload already committed.
    Replay(PostingResult),
}

/// Held while a posting runs. Dropping it without `complete` releases the key.
pub(crate) struct Reservation {
    in_flight: Arc<DashMap<IdempotencyKey, String>>,
    completed: Cache<IdempotencyKey, Arc<CompletedKey>>,
    key: IdempotencyKey,
    fingerprint: String,
}

impl Reservation {
    /// Remembers `result` for replays of this key.
    pub fn complete(self, result: &PostingResult) {
        // Recorded before the in-flight marker goes away in `drop`, so a
        // concurrent claim sees one or the other.
        self.completed.insert(
            self.key.clone(),
            Arc::new(CompletedKey {
                fingerprint: self.fingerprint.clone(),
                result: result.clone(),
            }),
        );
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

impl IdempotencyStore {
    /// Creates a store remembering up to `capacity` completed keys, each for
    /// at most `retention`.
    pub fn new(capacity: u64, retention: Duration) -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
            completed: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(retention)
                .build(),
        }
    }

    /// Claims `key` for a request whose canonical payload hashes to
    /// `fingerprint`.
    ///
    /// # Errors
    ///
    /// - `IdempotencyConflict` if the key was used for a different payload
    /// - `ConcurrentModification` while the same request is still in flight
    pub fn claim(&self, key: &IdempotencyKey, fingerprint: String) -> Result<Claim, LedgerError> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                if *occupied.get() == fingerprint {
                    Err(LedgerError::ConcurrentModification)
                } else {
                    Err(LedgerError::IdempotencyConflict(key.clone()))
                }
            }
            Entry::Vacant(vacant) => {
                if let Some(done) = self.completed.get(key) {
                    return if done.fingerprint == fingerprint {
                        Ok(Claim::Replay(done.result.clone()))
                    } else {
                        Err(LedgerError::IdempotencyConflict(key.clone()))
                    };
                }
                vacant.insert(fingerprint.clone());
                Ok(Claim::Reserved(Reservation {
                    in_flight: Arc::clone(&self.in_flight),
                    completed: self.completed.clone(),
                    key: key.clone(),
                    fingerprint,
                }))
            }
        }
    }

    /// Number of keys with a posting still running.
    #[cfg(test)]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

/// SHA-256 of the operation name and the canonical JSON of the payload, hex
/// encoded.
///
/// # Errors
///
/// Returns `InvalidInput` if the payload cannot be serialized.
pub(crate) fn fingerprint<T: Serialize>(
    operation: &str,
    payload: &T,
) -> Result<String, LedgerError> {
    let json = serde_json::to_vec(payload)
        .map_err(|err| LedgerError::InvalidInput(format!("unserializable request: {err}")))?;
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update([0]);
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}
