//! Per-owner mutation lock.
//!
//! Moves are check-then-write: fetch, cycle check against a snapshot, then
//! update. Two such sequences for the same owner must not interleave, or a
//! pair of individually valid moves can commit a cycle. Each owner gets its own
//! async mutex; different owners never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub struct OwnerLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner`'s nodes.
    ///
    /// The guard releases the lock on drop.
    pub async fn acquire(&self, owner: &str) -> OwnedMutexGuard<()> {
        let lock = {
            // A poisoned table only means another thread panicked mid-insert;
            // the map itself is still usable.
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(owner.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of owners that have taken a lock at least once
    pub fn owner_count(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}
