//! Single-record indexing with a bounded number of attempts.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use search_sync_repository::SearchIndexProvider;
use search_sync_shared::{IndexOutcome, PostDocument, PostRecord};

/// Projects posts into documents and upserts them.
///
/// Upserts overwrite the whole document under the post id, so indexing the
/// same post any number of times leaves exactly one document.
#[derive(Clone)]
pub struct RecordIndexer {
    provider: Arc<dyn SearchIndexProvider>,
    retry_backoff: Duration,
}

impl RecordIndexer {
    /// Create an indexer that retries immediately.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            retry_backoff: Duration::ZERO,
        }
    }

    /// Wait `backoff * attempt` after each failed attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Index one post, making at most `max_attempts` upsert calls.
    ///
    /// An unprojectable post is retried like any other failure. Nothing is
    /// returned as an error; the last failure cause ends up in
    /// [`IndexOutcome::Failed`].
    pub async fn index_with_retry(&self, record: &PostRecord, max_attempts: u32) -> IndexOutcome {
        if !record.is_eligible() {
            debug!(post_id = record.id, status = ?record.status, "Post not eligible, skipping");
            return IndexOutcome::Ineligible;
        }

        let max_attempts = max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.try_index(record).await {
                Ok(()) => {
                    debug!(post_id = record.id, attempt, "Post indexed");
                    return IndexOutcome::Indexed { attempts: attempt };
                }
                Err(e) => {
                    debug!(post_id = record.id, attempt, max_attempts, error = %e, "Index attempt failed");
                    last_error = e;
                }
            }

            if attempt < max_attempts && !self.retry_backoff.is_zero() {
                sleep(self.retry_backoff * attempt).await;
            }
        }

        warn!(
            post_id = record.id,
            attempts = max_attempts,
            error = %last_error,
            "Giving up on post after all attempts failed"
        );

        IndexOutcome::Failed {
            attempts: max_attempts,
            reason: last_error,
        }
    }

    async fn try_index(&self, record: &PostRecord) -> Result<(), String> {
        let document = PostDocument::from_record(record).map_err(|e| e.to_string())?;
        self.provider
            .upsert_document(&document)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draft_post, published_post, MockSearchProvider};

    #[tokio::test]
    async fn test_indexes_on_first_attempt() {
        let provider = Arc::new(MockSearchProvider::new());
        let indexer = RecordIndexer::new(provider.clone());

        let outcome = indexer.index_with_retry(&published_post(1), 3).await;

        assert_eq!(outcome, IndexOutcome::Indexed { attempts: 1 });
        assert_eq!(provider.upsert_calls(), 1);
        assert_eq!(provider.document_ids(), vec![1]);
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let provider = Arc::new(MockSearchProvider::new());
        provider.fail_next(1, 2);
        let indexer = RecordIndexer::new(provider.clone());

        let outcome = indexer.index_with_retry(&published_post(1), 3).await;

        assert_eq!(outcome, IndexOutcome::Indexed { attempts: 3 });
        assert_eq!(provider.upsert_calls(), 3);
    }

    #[tokio::test]
    async fn test_upsert_calls_never_exceed_max_attempts() {
        for max_attempts in 1..=5 {
            let provider = Arc::new(MockSearchProvider::new());
            provider.fail_always(1);
            let indexer = RecordIndexer::new(provider.clone());

            let outcome = indexer.index_with_retry(&published_post(1), max_attempts).await;

            assert!(matches!(
                outcome,
                IndexOutcome::Failed { attempts, .. } if attempts == max_attempts
            ));
            assert_eq!(provider.upsert_calls(), max_attempts as usize);
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_means_one() {
        let provider = Arc::new(MockSearchProvider::new());
        let indexer = RecordIndexer::new(provider.clone());

        let outcome = indexer.index_with_retry(&published_post(1), 0).await;

        assert!(outcome.succeeded());
        assert_eq!(provider.upsert_calls(), 1);
    }

    #[tokio::test]
    async fn test_ineligible_post_is_not_written() {
        let provider = Arc::new(MockSearchProvider::new());
        let indexer = RecordIndexer::new(provider.clone());

        let outcome = indexer.index_with_retry(&draft_post(1), 3).await;

        assert_eq!(outcome, IndexOutcome::Ineligible);
        assert_eq!(provider.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_unprojectable_post_fails_without_upsert() {
        let provider = Arc::new(MockSearchProvider::new());
        let indexer = RecordIndexer::new(provider.clone());
        let mut post = published_post(1);
        post.title = "   ".to_string();

        let outcome = indexer.index_with_retry(&post, 2).await;

        match outcome {
            IndexOutcome::Failed { attempts, reason } => {
                assert_eq!(attempts, 2);
                assert!(reason.contains("title"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(provider.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_indexing_twice_keeps_one_document() {
        let provider = Arc::new(MockSearchProvider::new());
        let indexer = RecordIndexer::new(provider.clone());
        let post = published_post(9);

        indexer.index_with_retry(&post, 3).await;
        let count_after_first = provider.count_documents().await.unwrap();
        indexer.index_with_retry(&post, 3).await;

        assert_eq!(provider.count_documents().await.unwrap(), count_after_first);
        assert_eq!(count_after_first, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_between_attempts() {
        let provider = Arc::new(MockSearchProvider::new());
        provider.fail_next(1, 2);
        let indexer =
            RecordIndexer::new(provider.clone()).with_backoff(Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        let outcome = indexer.index_with_retry(&published_post(1), 3).await;

        assert!(outcome.succeeded());
        // 500ms after the first failure, 1000ms after the second
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed < Duration::from_millis(1600));
    }
}
