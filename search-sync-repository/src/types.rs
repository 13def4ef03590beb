//! Record types stored by the repository backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post id that failed indexing and is waiting for a retry.
///
/// Entries leave the failure store when a retry succeeds, when the post is no
/// longer eligible, or when `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// The post that failed indexing.
    pub post_id: i64,
    /// When the id was (last) added.
    pub enqueued_at: DateTime<Utc>,
    /// When the backend will drop the entry.
    pub expires_at: DateTime<Utc>,
}

impl FailureEntry {
    /// Whether the entry has passed its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
