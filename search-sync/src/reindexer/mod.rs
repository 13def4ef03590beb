//! Paginated rebuild of the search index from the post store.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::MAX_INDEX_CONCURRENCY;
use crate::errors::SyncError;
use crate::failure_queue::FailureQueue;
use crate::indexer::RecordIndexer;
use search_sync_repository::PostStore;
use search_sync_shared::{BatchRunResult, IndexOutcome, PostRecord};

/// Walks the post store page by page and indexes every eligible post.
///
/// Pages are fetched one after another at increasing offsets so a run can be
/// resumed from [`BatchRunResult::next_offset`]. Within a page, up to
/// `concurrency` upserts run at once.
#[derive(Clone)]
pub struct BatchReindexer {
    store: Arc<dyn PostStore>,
    indexer: RecordIndexer,
    failures: FailureQueue,
    max_attempts: u32,
    concurrency: usize,
}

impl BatchReindexer {
    pub fn new(
        store: Arc<dyn PostStore>,
        indexer: RecordIndexer,
        failures: FailureQueue,
        max_attempts: u32,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            indexer,
            failures,
            max_attempts,
            concurrency: concurrency.clamp(1, MAX_INDEX_CONCURRENCY),
        }
    }

    /// Reindex everything from `start_offset` onwards.
    ///
    /// Record failures are counted and queued, never returned. The run stops
    /// between pages when `cancel` fires, returning the partial counts with
    /// `cancelled` set. A failed page fetch returns
    /// [`SyncError::BatchAborted`] with the counts gathered so far.
    #[instrument(skip(self, cancel))]
    pub async fn run(
        &self,
        batch_size: usize,
        start_offset: u64,
        cancel: &CancellationToken,
    ) -> Result<BatchRunResult, SyncError> {
        if batch_size == 0 {
            return Err(SyncError::config("batch size must be greater than zero"));
        }

        let mut result = BatchRunResult::starting_at(start_offset);

        loop {
            if cancel.is_cancelled() {
                warn!(
                    next_offset = result.next_offset,
                    total_scanned = result.total_scanned,
                    "Reindex cancelled, stopping before next page"
                );
                result.cancelled = true;
                return Ok(result);
            }

            let page = match self.store.fetch_page(result.next_offset, batch_size).await {
                Ok(page) => page,
                Err(e) => {
                    error!(offset = result.next_offset, error = %e, "Failed to fetch page, aborting reindex");
                    return Err(SyncError::BatchAborted {
                        partial: result,
                        reason: e.to_string(),
                    });
                }
            };

            let page_len = page.len();
            if page_len == 0 {
                break;
            }

            self.index_page(page, &mut result).await;
            result.next_offset += page_len as u64;

            info!(
                offset = result.next_offset,
                page_len,
                total_indexed = result.total_indexed,
                total_skipped = result.total_skipped,
                total_failed = result.total_failed,
                "Page reindexed"
            );

            if page_len < batch_size {
                break;
            }
        }

        Ok(result)
    }

    async fn index_page(&self, page: Vec<PostRecord>, result: &mut BatchRunResult) {
        let outcomes = stream::iter(page.into_iter().map(|record| async move {
            let outcome = self.indexer.index_with_retry(&record, self.max_attempts).await;
            (record.id, outcome)
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        for (post_id, outcome) in outcomes {
            match &outcome {
                IndexOutcome::Indexed { .. } => self.failures.remove(post_id).await,
                IndexOutcome::Failed { .. } => self.failures.add(post_id).await,
                IndexOutcome::Ineligible => {}
            }
            result.record(&outcome);
        }
    }
}
