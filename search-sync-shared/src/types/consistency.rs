//! Consistency report comparing the authoritative store with the search index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a report does or does not ask for a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildReason {
    /// The store has eligible posts but the index holds no documents.
    IndexEmpty,
    /// The index holds fewer documents than the configured share of eligible posts.
    BelowThreshold,
    Healthy,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::IndexEmpty => "index empty",
            Self::BelowThreshold => "sync ratio below threshold",
            Self::Healthy => "healthy",
        };
        f.write_str(reason)
    }
}

/// Snapshot of how far the search index has drifted from the store.
///
/// Derived on demand from two counts; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub authoritative_count: i64,
    pub index_count: i64,
    /// `index_count / authoritative_count`, clamped to `[0, 1]`; `0` for an empty store.
    pub sync_ratio: f64,
    pub needs_rebuild: bool,
    pub reason: RebuildReason,
}

impl ConsistencyReport {
    /// Compute the report for a pair of counts and a minimum acceptable ratio.
    ///
    /// An empty store is never treated as divergence, whatever the index holds.
    pub fn compute(authoritative_count: i64, index_count: i64, threshold: f64) -> Self {
        let sync_ratio = if authoritative_count > 0 {
            (index_count.max(0) as f64 / authoritative_count as f64).min(1.0)
        } else {
            0.0
        };

        let reason = if authoritative_count <= 0 {
            RebuildReason::Healthy
        } else if index_count <= 0 {
            RebuildReason::IndexEmpty
        } else if sync_ratio < threshold {
            RebuildReason::BelowThreshold
        } else {
            RebuildReason::Healthy
        };

        Self {
            authoritative_count,
            index_count,
            sync_ratio,
            needs_rebuild: reason != RebuildReason::Healthy,
            reason,
        }
    }

    /// Sync ratio as a percentage, for log output.
    pub fn sync_percent(&self) -> f64 {
        self.sync_ratio * 100.0
    }
}
