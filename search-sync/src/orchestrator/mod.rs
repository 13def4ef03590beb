//! Orchestrator module for the search sync engine.
//!
//! Composes the consistency monitor, batch reindexer and retry coordinator,
//! and exposes the operations admin tooling triggers.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::failure_queue::FailureQueue;
use crate::indexer::RecordIndexer;
use crate::monitor::ConsistencyMonitor;
use crate::reindexer::BatchReindexer;
use crate::retry::RetryCoordinator;
use search_sync_repository::{FailureEntry, FailureStore, PostStore, SearchIndexProvider};
use search_sync_shared::{BatchRunResult, ConsistencyReport, IndexOutcome};

/// Where the orchestrator is in a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Evaluating,
    Healthy,
    RebuildNeeded,
    Rebuilding,
}

/// What a startup pass ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Sync is switched off.
    Disabled,
    /// A store could not be counted; nothing was done.
    Unavailable { reason: String },
    Healthy(ConsistencyReport),
    /// A rebuild is needed but automatic rebuilds are off.
    RebuildDeclined(ConsistencyReport),
    Rebuilt {
        report: ConsistencyReport,
        result: BatchRunResult,
    },
    RebuildFailed {
        report: ConsistencyReport,
        reason: String,
    },
    /// Another rebuild was already running.
    RebuildSkipped(ConsistencyReport),
}

/// Entry point of the sync engine.
///
/// The orchestrator:
/// - Runs the startup consistency pass
/// - Allows one rebuild at a time
/// - Serves single-post reindexing, status and retry requests
/// - Publishes its [`SyncState`] on a watch channel
pub struct SyncOrchestrator {
    config: SyncConfig,
    store: Arc<dyn PostStore>,
    provider: Arc<dyn SearchIndexProvider>,
    indexer: RecordIndexer,
    failures: FailureQueue,
    monitor: ConsistencyMonitor,
    reindexer: BatchReindexer,
    retry: RetryCoordinator,
    rebuild_guard: Mutex<()>,
    state: watch::Sender<SyncState>,
}

impl SyncOrchestrator {
    /// Wire the engine components over the given gateways.
    ///
    /// Without a failure store, failed posts are only logged.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn PostStore>,
        provider: Arc<dyn SearchIndexProvider>,
        failure_store: Option<Arc<dyn FailureStore>>,
    ) -> Self {
        let indexer = RecordIndexer::new(provider.clone()).with_backoff(config.retry_backoff);
        let failures = FailureQueue::new(failure_store, config.failure_entry_ttl);
        let monitor = ConsistencyMonitor::new(store.clone(), provider.clone(), config.sync_threshold);
        let reindexer = BatchReindexer::new(
            store.clone(),
            indexer.clone(),
            failures.clone(),
            config.max_attempts,
            config.concurrency,
        );
        let retry = RetryCoordinator::new(
            store.clone(),
            indexer.clone(),
            failures.clone(),
            config.max_attempts,
        );
        let (state, _) = watch::channel(SyncState::Idle);

        Self {
            config,
            store,
            provider,
            indexer,
            failures,
            monitor,
            reindexer,
            retry,
            rebuild_guard: Mutex::new(()),
            state,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Follow state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SyncState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "Sync state changed");
        }
    }

    /// Check consistency and rebuild when allowed.
    ///
    /// Never fails; the returned [`SyncOutcome`] says what happened. The pass
    /// holds the rebuild guard throughout and every path ends in
    /// [`SyncState::Idle`]. When a rebuild is already running the pass still
    /// reports the verdict but publishes no state, and a needed rebuild is
    /// reported as [`SyncOutcome::RebuildSkipped`].
    #[instrument(skip(self, cancel))]
    pub async fn run_startup(&self, cancel: &CancellationToken) -> SyncOutcome {
        if !self.config.enabled {
            info!("Search sync disabled, skipping startup check");
            return SyncOutcome::Disabled;
        }

        let guard = self.rebuild_guard.try_lock().ok();
        if guard.is_none() {
            debug!("Rebuild in progress, startup pass leaves sync state untouched");
        }
        let publish = |next: SyncState| {
            if guard.is_some() {
                self.transition(next);
            }
        };

        publish(SyncState::Evaluating);

        let report = match self.monitor.evaluate().await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Consistency check unavailable, skipping this cycle");
                publish(SyncState::Idle);
                return SyncOutcome::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        if !report.needs_rebuild {
            publish(SyncState::Healthy);
            info!(
                authoritative_count = report.authoritative_count,
                index_count = report.index_count,
                sync_percent = format!("{:.2}", report.sync_percent()),
                "Search index healthy"
            );
            publish(SyncState::Idle);
            return SyncOutcome::Healthy(report);
        }

        publish(SyncState::RebuildNeeded);
        warn!(
            authoritative_count = report.authoritative_count,
            index_count = report.index_count,
            sync_percent = format!("{:.2}", report.sync_percent()),
            threshold = self.config.sync_threshold,
            reason = %report.reason,
            "Search index diverged from post store"
        );

        if !self.config.auto_init_enabled {
            warn!(
                "Automatic rebuild disabled (SYNC_AUTO_INIT_ENABLED=false); trigger a full rebuild manually to restore the index"
            );
            publish(SyncState::Idle);
            return SyncOutcome::RebuildDeclined(report);
        }

        if guard.is_none() {
            warn!("Rebuild needed but another rebuild is running, skipping");
            return SyncOutcome::RebuildSkipped(report);
        }

        match self.run_rebuild(self.config.batch_size, 0, cancel).await {
            Ok(result) => SyncOutcome::Rebuilt { report, result },
            Err(e) => SyncOutcome::RebuildFailed {
                report,
                reason: e.to_string(),
            },
        }
    }

    /// Run a full rebuild on request.
    ///
    /// `batch_size` defaults to the configured page size and `start_offset`
    /// to 0. Fails with [`SyncError::RebuildInProgress`] while another
    /// rebuild or a startup pass runs.
    #[instrument(skip(self, cancel))]
    pub async fn trigger_rebuild(
        &self,
        batch_size: Option<usize>,
        start_offset: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<BatchRunResult, SyncError> {
        let Ok(_guard) = self.rebuild_guard.try_lock() else {
            warn!("Rebuild requested while another rebuild is running, rejecting");
            return Err(SyncError::RebuildInProgress);
        };

        self.run_rebuild(
            batch_size.unwrap_or(self.config.batch_size),
            start_offset.unwrap_or(0),
            cancel,
        )
        .await
    }

    /// Callers must hold the rebuild guard.
    async fn run_rebuild(
        &self,
        batch_size: usize,
        start_offset: u64,
        cancel: &CancellationToken,
    ) -> Result<BatchRunResult, SyncError> {
        self.transition(SyncState::Rebuilding);
        info!(batch_size, start_offset, "Starting search index rebuild");

        let result = self.reindexer.run(batch_size, start_offset, cancel).await;
        self.transition(SyncState::Idle);

        match result {
            Ok(result) => {
                info!(
                    total_scanned = result.total_scanned,
                    total_indexed = result.total_indexed,
                    total_skipped = result.total_skipped,
                    total_failed = result.total_failed,
                    next_offset = result.next_offset,
                    cancelled = result.cancelled,
                    "Search index rebuild finished"
                );
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Search index rebuild failed");
                Err(e)
            }
        }
    }

    /// Reindex a single post by id.
    ///
    /// Returns `Ok(None)` when the post does not exist. An ineligible post
    /// has its document removed. Either way the failure queue is updated to
    /// match the result.
    #[instrument(skip(self))]
    pub async fn reindex_record(&self, post_id: i64) -> Result<Option<IndexOutcome>, SyncError> {
        let Some(record) = self.store.fetch_by_id(post_id).await? else {
            info!(post_id, "Post not found, removing any stale document");
            self.provider.delete_document(post_id).await?;
            self.failures.remove(post_id).await;
            return Ok(None);
        };

        let outcome = self
            .indexer
            .index_with_retry(&record, self.config.max_attempts)
            .await;

        match &outcome {
            IndexOutcome::Indexed { attempts } => {
                self.failures.remove(post_id).await;
                info!(post_id, attempts, "Post reindexed");
            }
            IndexOutcome::Ineligible => {
                self.provider.delete_document(post_id).await?;
                self.failures.remove(post_id).await;
                info!(post_id, "Post not eligible, document removed");
            }
            IndexOutcome::Failed { attempts, reason } => {
                self.failures.add(post_id).await;
                warn!(post_id, attempts, reason = %reason, "Post reindex failed, queued for retry");
            }
        }

        Ok(Some(outcome))
    }

    /// Current consistency report.
    pub async fn status(&self) -> Result<ConsistencyReport, SyncError> {
        self.monitor.evaluate().await
    }

    /// Posts waiting for a retry, with their enqueue and expiry times.
    pub async fn failed_entries(&self) -> Result<Vec<FailureEntry>, SyncError> {
        self.failures.entries().await
    }

    /// Retry every post in the failure queue.
    ///
    /// Does not take the rebuild guard.
    #[instrument(skip(self))]
    pub async fn retry_failed(&self) -> Result<BatchRunResult, SyncError> {
        if !self.failures.is_enabled() {
            warn!("No failure store configured, nothing to retry");
        }

        match self.retry.retry_failed().await {
            Ok(result) => {
                if result.total_scanned > 0 {
                    info!(
                        total_indexed = result.total_indexed,
                        total_skipped = result.total_skipped,
                        total_failed = result.total_failed,
                        "Retry pass finished"
                    );
                }
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Retry pass failed");
                Err(e)
            }
        }
    }

    /// Remove a post's document and any failure entry for it.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, post_id: i64) -> Result<(), SyncError> {
        self.provider.delete_document(post_id).await?;
        self.failures.remove(post_id).await;
        info!(post_id, "Post removed from search index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draft_post, MockPostStore, MockSearchProvider};
    use search_sync_repository::InMemoryFailureStore;
    use std::time::Duration;

    fn build(
        config: SyncConfig,
        store: Arc<MockPostStore>,
        provider: Arc<MockSearchProvider>,
    ) -> (SyncOrchestrator, Arc<InMemoryFailureStore>) {
        let failure_store = Arc::new(InMemoryFailureStore::new());
        let queue_store: Arc<dyn FailureStore> = failure_store.clone();
        (
            SyncOrchestrator::new(config, store, provider, Some(queue_store)),
            failure_store,
        )
    }

    #[tokio::test]
    async fn test_disabled_does_nothing() {
        let store = Arc::new(MockPostStore::published(10));
        let provider = Arc::new(MockSearchProvider::new());
        let config = SyncConfig {
            enabled: false,
            ..SyncConfig::default()
        };
        let (orchestrator, _) = build(config, store.clone(), provider.clone());

        let outcome = orchestrator.run_startup(&CancellationToken::new()).await;

        assert_eq!(outcome, SyncOutcome::Disabled);
        assert_eq!(provider.upsert_calls(), 0);
        assert_eq!(orchestrator.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn test_empty_index_is_rebuilt() {
        let store = Arc::new(MockPostStore::published(25));
        let provider = Arc::new(MockSearchProvider::new());
        let config = SyncConfig {
            batch_size: 10,
            ..SyncConfig::default()
        };
        let (orchestrator, _) = build(config, store, provider.clone());

        let outcome = orchestrator.run_startup(&CancellationToken::new()).await;

        match outcome {
            SyncOutcome::Rebuilt { report, result } => {
                assert_eq!(report.index_count, 0);
                assert_eq!(result.total_indexed, 25);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(provider.document_ids().len(), 25);
        assert_eq!(orchestrator.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn test_auto_init_disabled_leaves_index_untouched() {
        let store = Arc::new(MockPostStore::published(10));
        let provider = Arc::new(MockSearchProvider::with_documents(1..=2));
        let config = SyncConfig {
            auto_init_enabled: false,
            ..SyncConfig::default()
        };
        let (orchestrator, _) = build(config, store, provider.clone());

        let outcome = orchestrator.run_startup(&CancellationToken::new()).await;

        assert!(matches!(outcome, SyncOutcome::RebuildDeclined(_)));
        assert_eq!(provider.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_reindex_missing_post() {
        let store = Arc::new(MockPostStore::published(1));
        let provider = Arc::new(MockSearchProvider::new());
        let (orchestrator, _) = build(SyncConfig::default(), store, provider.clone());

        assert_eq!(orchestrator.reindex_record(42).await.unwrap(), None);
        assert_eq!(provider.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_reindex_ineligible_post_removes_document() {
        let store = Arc::new(MockPostStore::new(vec![draft_post(5)]));
        let provider = Arc::new(MockSearchProvider::with_documents([5]));
        let (orchestrator, failure_store) =
            build(SyncConfig::default(), store, provider.clone());
        failure_store.add(5, Duration::from_secs(60)).await.unwrap();

        let outcome = orchestrator.reindex_record(5).await.unwrap();

        assert_eq!(outcome, Some(IndexOutcome::Ineligible));
        assert!(provider.document_ids().is_empty());
        assert!(failure_store.members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reindex_is_queued() {
        let store = Arc::new(MockPostStore::published(3));
        let provider = Arc::new(MockSearchProvider::new());
        provider.fail_always(2);
        let (orchestrator, failure_store) =
            build(SyncConfig::default(), store, provider.clone());

        let outcome = orchestrator.reindex_record(2).await.unwrap();

        assert!(matches!(outcome, Some(IndexOutcome::Failed { attempts: 3, .. })));
        assert_eq!(failure_store.members().await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_failed_entries_lists_queued_posts() {
        let store = Arc::new(MockPostStore::published(3));
        let provider = Arc::new(MockSearchProvider::new());
        provider.fail_always(3);
        let (orchestrator, _) = build(SyncConfig::default(), store, provider);

        orchestrator.reindex_record(3).await.unwrap();

        let entries = orchestrator.failed_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].post_id, 3);
        assert!(entries[0].expires_at > entries[0].enqueued_at);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let store = Arc::new(MockPostStore::published(3));
        let provider = Arc::new(MockSearchProvider::with_documents(1..=3));
        let (orchestrator, failure_store) =
            build(SyncConfig::default(), store, provider.clone());
        failure_store.add(2, Duration::from_secs(60)).await.unwrap();

        orchestrator.delete_record(2).await.unwrap();

        assert_eq!(provider.document_ids(), vec![1, 3]);
        assert_eq!(provider.delete_calls(), 1);
        assert!(failure_store.members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_state_returns_to_idle_after_unavailable() {
        let store = Arc::new(MockPostStore::unreachable());
        let provider = Arc::new(MockSearchProvider::new());
        let (orchestrator, _) = build(SyncConfig::default(), store, provider);
        let mut states = orchestrator.subscribe();

        let outcome = orchestrator.run_startup(&CancellationToken::new()).await;

        assert!(matches!(outcome, SyncOutcome::Unavailable { .. }));
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), SyncState::Idle);
    }
}
