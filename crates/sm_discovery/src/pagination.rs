use async_trait::async_trait;
use sm_core::QueryKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-query read offsets. Offsets start at 0 the first time a key is seen.
///
/// Callers hold the guard returned by [`PaginationStore::lock`] across
/// reading the offset, fetching the page and advancing, so that two requests
/// for the same key never read the same rows.
#[async_trait]
pub trait PaginationStore: Send + Sync {
    async fn lock(&self, key: &QueryKey) -> OwnedMutexGuard<()>;
    async fn get(&self, key: &QueryKey) -> u64;
    /// Move the offset forward by `rows` and return the new offset
    async fn advance(&self, key: &QueryKey, rows: u64) -> u64;
    async fn reset(&self, key: &QueryKey);
}

/// In-process pagination state. Lost on restart.
#[derive(Debug, Default)]
pub struct PaginationTracker {
    offsets: Mutex<HashMap<QueryKey, u64>>,
    locks: Mutex<HashMap<QueryKey, Arc<Mutex<()>>>>,
}

impl PaginationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a recorded offset
    pub async fn tracked_keys(&self) -> usize {
        self.offsets.lock().await.len()
    }

    /// Number of keys with a live lock entry
    pub async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[async_trait]
impl PaginationStore for PaginationTracker {
    async fn lock(&self, key: &QueryKey) -> OwnedMutexGuard<()> {
        let key_lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on are only referenced by the map.
            locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        key_lock.lock_owned().await
    }

    async fn get(&self, key: &QueryKey) -> u64 {
        self.offsets.lock().await.get(key).copied().unwrap_or(0)
    }

    async fn advance(&self, key: &QueryKey, rows: u64) -> u64 {
        let mut offsets = self.offsets.lock().await;
        let offset = offsets.entry(key.clone()).or_insert(0);
        *offset += rows;
        *offset
    }

    async fn reset(&self, key: &QueryKey) {
        self.offsets.lock().await.insert(key.clone(), 0);
    }
}
