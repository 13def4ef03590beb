//! Re-attempts posts recorded in the failure queue.

use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::errors::SyncError;
use crate::failure_queue::FailureQueue;
use crate::indexer::RecordIndexer;
use search_sync_repository::PostStore;
use search_sync_shared::{BatchRunResult, IndexOutcome};

/// Drains the failure queue through the record indexer.
///
/// Every step is an idempotent upsert or removal, so a pass may overlap with
/// a rebuild or with another pass.
#[derive(Clone)]
pub struct RetryCoordinator {
    store: Arc<dyn PostStore>,
    indexer: RecordIndexer,
    failures: FailureQueue,
    max_attempts: u32,
}

impl RetryCoordinator {
    pub fn new(
        store: Arc<dyn PostStore>,
        indexer: RecordIndexer,
        failures: FailureQueue,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            indexer,
            failures,
            max_attempts,
        }
    }

    /// Retry every queued post once.
    ///
    /// Posts that are gone or no longer eligible are dropped from the queue
    /// without an index call and counted as skipped. Posts that fail again
    /// stay queued until their entry expires. `next_offset` stays 0; a pass
    /// that aborts leaves unprocessed entries queued for the next pass.
    #[instrument(skip(self))]
    pub async fn retry_failed(&self) -> Result<BatchRunResult, SyncError> {
        let members = self.failures.members().await?;
        let mut result = BatchRunResult::default();

        for post_id in members {
            let record = match self.store.fetch_by_id(post_id).await {
                Ok(record) => record,
                Err(e) => {
                    error!(post_id, error = %e, "Failed to load queued post, aborting retry pass");
                    return Err(SyncError::BatchAborted {
                        partial: result,
                        reason: e.to_string(),
                    });
                }
            };

            let outcome = match record {
                Some(record) if record.is_eligible() => {
                    self.indexer.index_with_retry(&record, self.max_attempts).await
                }
                _ => {
                    debug!(post_id, "Queued post is gone or ineligible, dropping entry");
                    IndexOutcome::Ineligible
                }
            };

            match &outcome {
                IndexOutcome::Indexed { .. } | IndexOutcome::Ineligible => {
                    self.failures.remove(post_id).await
                }
                IndexOutcome::Failed { .. } => {}
            }

            result.record(&outcome);
        }

        Ok(result)
    }
}
