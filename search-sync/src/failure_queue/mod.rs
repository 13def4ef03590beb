//! Best-effort tracking of posts that could not be indexed.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::SyncError;
use search_sync_repository::{FailureEntry, FailureStore};

/// TTL-bounded set of post ids waiting for a retry.
///
/// The backing store is optional. Without one, or when the store fails,
/// `add` and `remove` log a warning and return so that indexing never
/// depends on failure tracking.
#[derive(Clone)]
pub struct FailureQueue {
    store: Option<Arc<dyn FailureStore>>,
    ttl: Duration,
}

impl FailureQueue {
    pub fn new(store: Option<Arc<dyn FailureStore>>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// A queue that tracks nothing.
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Insert the id or refresh its expiry.
    pub async fn add(&self, post_id: i64) {
        let Some(store) = &self.store else {
            warn!(post_id, "No failure store configured, failed post not tracked");
            return;
        };

        match store.add(post_id, self.ttl).await {
            Ok(()) => debug!(post_id, ttl_secs = self.ttl.as_secs(), "Post queued for retry"),
            Err(e) => warn!(post_id, error = %e, "Failed to queue post for retry"),
        }
    }

    /// Drop the id if present.
    pub async fn remove(&self, post_id: i64) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.remove(post_id).await {
            warn!(post_id, error = %e, "Failed to remove post from failure queue");
        }
    }

    /// Snapshot of the queued ids.
    ///
    /// Empty when no store is configured. A store error is returned rather
    /// than read as an empty queue.
    pub async fn members(&self) -> Result<Vec<i64>, SyncError> {
        match &self.store {
            Some(store) => Ok(store.members().await?),
            None => Ok(Vec::new()),
        }
    }

    /// Queued entries with their enqueue and expiry times.
    pub async fn entries(&self) -> Result<Vec<FailureEntry>, SyncError> {
        match &self.store {
            Some(store) => Ok(store.entries().await?),
            None => Ok(Vec::new()),
        }
    }
}
