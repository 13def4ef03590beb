//! Error types for the search sync repository.
//!
//! Each gateway has its own error type so callers can tell an unavailable
//! post store from an unavailable search index.

mod failure_store_error;
mod post_store_error;
mod search_index_error;

pub use failure_store_error::FailureStoreError;
pub use post_store_error::PostStoreError;
pub use search_index_error::SearchIndexError;
