//! Divergence check between the post store and the search index.

use std::sync::Arc;
use tracing::debug;

use crate::errors::SyncError;
use search_sync_repository::{PostStore, SearchIndexProvider};
use search_sync_shared::ConsistencyReport;

/// Compares eligible post count with indexed document count.
#[derive(Clone)]
pub struct ConsistencyMonitor {
    store: Arc<dyn PostStore>,
    provider: Arc<dyn SearchIndexProvider>,
    threshold: f64,
}

impl ConsistencyMonitor {
    pub fn new(
        store: Arc<dyn PostStore>,
        provider: Arc<dyn SearchIndexProvider>,
        threshold: f64,
    ) -> Self {
        Self {
            store,
            provider,
            threshold,
        }
    }

    /// Read both counts and compute the verdict.
    ///
    /// If either side cannot be counted the error is returned instead of a
    /// report; an unreachable store says nothing about divergence.
    pub async fn evaluate(&self) -> Result<ConsistencyReport, SyncError> {
        let authoritative_count = self.store.count_eligible().await?;
        let index_count = self.provider.count_documents().await?;

        let report = ConsistencyReport::compute(authoritative_count, index_count, self.threshold);

        debug!(
            authoritative_count,
            index_count,
            sync_ratio = report.sync_ratio,
            needs_rebuild = report.needs_rebuild,
            "Consistency evaluated"
        );

        Ok(report)
    }
}
