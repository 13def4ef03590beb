//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, PostgreSQL, etc.).

use async_trait::async_trait;
use search_sync_shared::PostDocument;

use crate::errors::SearchIndexError;

/// Abstracts the underlying search index implementation.
///
/// This trait defines the interface for all search index backends. The backend
/// is selected once at composition time (see [`crate::SearchBackend`]) and
/// injected into the engine as `Arc<dyn SearchIndexProvider>`, which also makes
/// testing with mock implementations straightforward.
///
/// # Upsert Semantics
///
/// `upsert_document` writes the whole document under its id, replacing any
/// previous version. Writing the same document twice leaves the index in the
/// same state as writing it once: no duplicates, no partial merges.
///
/// # Index Initialization
///
/// Implementations should call `ensure_index_exists` during application startup to ensure
/// the search index and any aliases are properly configured before performing document operations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index and any required aliases exist, creating them if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Insert or fully overwrite a document.
    ///
    /// # Arguments
    ///
    /// * `document` - The projected post document
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn upsert_document(&self, document: &PostDocument) -> Result<(), SearchIndexError>;

    /// Delete a document from the search index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    ///
    /// # Arguments
    ///
    /// * `post_id` - The id of the post whose document should be removed
    async fn delete_document(&self, post_id: i64) -> Result<(), SearchIndexError>;

    /// Count the documents currently in the index.
    async fn count_documents(&self) -> Result<i64, SearchIndexError>;
}
