//! Authoritative post store trait definition.

use async_trait::async_trait;
use search_sync_shared::PostRecord;

use crate::errors::PostStoreError;

/// Read access to the authoritative post store.
///
/// The sync engine never writes through this trait. Implementations must
/// return pages in a stable, monotonic order so that walking increasing
/// offsets eventually covers every record.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Count posts that are currently eligible for the search index.
    async fn count_eligible(&self) -> Result<i64, PostStoreError>;

    /// Fetch up to `limit` posts of any status starting at `offset`.
    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Vec<PostRecord>, PostStoreError>;

    /// Fetch one post by id; `Ok(None)` if it does not exist.
    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>, PostStoreError>;
}
