//! Error types for the search sync engine.

use search_sync_repository::{FailureStoreError, PostStoreError, SearchIndexError};
use search_sync_shared::BatchRunResult;
use thiserror::Error;

/// Errors that stop a sync operation.
///
/// Record-level failures never show up here; they are counted in a
/// [`BatchRunResult`] and routed to the failure queue. These variants mean a
/// whole gateway could not answer, a run had to stop part way, or the caller
/// asked for something that cannot be done right now.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The authoritative post store could not be read.
    #[error("Post store unavailable: {0}")]
    StoreUnavailable(String),

    /// The search index could not be read or written.
    #[error("Search index unavailable: {0}")]
    IndexUnavailable(String),

    /// The failure queue's store could not be read.
    #[error("Failure queue unavailable: {0}")]
    QueueUnavailable(String),

    /// A run stopped after processing part of the records.
    ///
    /// `partial` holds the counts up to the failure. For a rebuild its
    /// `next_offset` points at the first unprocessed record; a retry pass
    /// leaves it at 0.
    #[error("Run aborted after {} records: {reason}", partial.total_scanned)]
    BatchAborted {
        partial: BatchRunResult,
        reason: String,
    },

    /// Another rebuild holds the rebuild guard.
    #[error("A rebuild is already in progress")]
    RebuildInProgress,

    /// Invalid configuration or arguments.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<PostStoreError> for SyncError {
    fn from(err: PostStoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<SearchIndexError> for SyncError {
    fn from(err: SearchIndexError) -> Self {
        Self::IndexUnavailable(err.to_string())
    }
}

impl From<FailureStoreError> for SyncError {
    fn from(err: FailureStoreError) -> Self {
        Self::QueueUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_aborted_message_includes_count() {
        let mut partial = BatchRunResult::default();
        partial.total_scanned = 250;
        let err = SyncError::BatchAborted {
            partial,
            reason: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "Run aborted after 250 records: connection reset"
        );
    }

    #[test]
    fn test_index_error_maps_to_index_unavailable() {
        let err: SyncError = SearchIndexError::connection("refused").into();
        assert!(matches!(err, SyncError::IndexUnavailable(_)));
    }
}
