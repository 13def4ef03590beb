//! Interface definitions for the sync engine's gateways.
//!
//! These traits allow dependency injection and swappable backends for the
//! post store, the search index and the failure store.

mod failure_store;
mod post_store;
mod search_index_provider;

pub use failure_store::FailureStore;
pub use post_store::PostStore;
pub use search_index_provider::SearchIndexProvider;
