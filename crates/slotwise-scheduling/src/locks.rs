//! In-process keyed locks serializing check-and-commit per provider day.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Everything that can conflict with a booking lives under this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub tenant_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
}

/// Held while a booking is checked and committed. Dropping it releases
/// the key.
pub struct SlotGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Default)]
pub struct SlotLocks {
    entries: Mutex<HashMap<SlotKey, Arc<AsyncMutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `key`.
    pub async fn acquire(&self, key: SlotKey) -> SlotGuard {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody is holding or waiting on can go.
            entries.retain(|k, lock| *k == key || Arc::strong_count(lock) > 1);
            entries.entry(key).or_default().clone()
        };
        SlotGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
