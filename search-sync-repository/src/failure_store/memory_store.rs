//! In-memory implementation of the failure store.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::FailureStoreError;
use crate::interfaces::FailureStore;
use crate::types::FailureEntry;

/// Process-local failure store.
///
/// Entries carry their own `expires_at`; expired entries are never returned
/// and are dropped on the next access. Every operation holds the lock for its
/// whole duration, which makes each one atomic.
#[derive(Default)]
pub struct InMemoryFailureStore {
    entries: Mutex<HashMap<i64, FailureEntry>>,
}

impl InMemoryFailureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the map and purge expired entries.
    fn live_entries(&self) -> MutexGuard<'_, HashMap<i64, FailureEntry>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        entries
    }
}

#[async_trait]
impl FailureStore for InMemoryFailureStore {
    async fn add(&self, post_id: i64, ttl: Duration) -> Result<(), FailureStoreError> {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        let enqueued_at = Utc::now();
        let expires_at = enqueued_at
            .checked_add_signed(ttl)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);

        self.live_entries().insert(
            post_id,
            FailureEntry {
                post_id,
                enqueued_at,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, post_id: i64) -> Result<(), FailureStoreError> {
        self.live_entries().remove(&post_id);
        Ok(())
    }

    async fn members(&self) -> Result<Vec<i64>, FailureStoreError> {
        let mut ids: Vec<i64> = self.live_entries().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn entries(&self) -> Result<Vec<FailureEntry>, FailureStoreError> {
        let mut entries: Vec<FailureEntry> = self.live_entries().values().cloned().collect();
        entries.sort_by_key(|entry| entry.post_id);
        Ok(entries)
    }
}
