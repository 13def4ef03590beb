//! Durable TTL set trait definition.

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::FailureStoreError;
use crate::types::FailureEntry;

/// A durable set of post ids with a per-entry time to live.
///
/// Every operation must be atomic in the backing store. Expiry is the store's
/// job: an expired entry must not be returned by `members` or `entries`,
/// without anyone having to poll and delete it.
#[async_trait]
pub trait FailureStore: Send + Sync {
    /// Insert an id, or refresh its expiry if already present.
    async fn add(&self, post_id: i64, ttl: Duration) -> Result<(), FailureStoreError>;

    /// Remove an id; removing an absent id is not an error.
    async fn remove(&self, post_id: i64) -> Result<(), FailureStoreError>;

    /// Snapshot of the ids currently in the set.
    async fn members(&self) -> Result<Vec<i64>, FailureStoreError>;

    /// Snapshot of the entries with their timestamps.
    async fn entries(&self) -> Result<Vec<FailureEntry>, FailureStoreError>;
}
