//! # Search Sync
//!
//! Keeps the post search index consistent with the authoritative post store.
//!
//! ## Architecture
//!
//! Synchronization runs on startup or on request, never inline with user
//! traffic:
//!
//! 1. **Monitor**: Compares eligible post count with indexed document count
//! 2. **Reindexer**: Rebuilds the index page by page when they diverge
//! 3. **Indexer**: Projects and upserts one post with bounded retries
//! 4. **Failure queue**: Remembers posts that could not be indexed
//! 5. **Retry**: Re-attempts queued posts
//! 6. **Orchestrator**: Ties the above together behind one entry point
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`monitor`]: Consistency verdicts
//! - [`indexer`]: Single-post indexing
//! - [`reindexer`]: Paginated rebuilds
//! - [`failure_queue`]: Best-effort failure tracking
//! - [`retry`]: Failure queue draining
//! - [`orchestrator`]: Startup pass and admin operations
//! - [`errors`]: Error types for the engine

pub mod config;
pub mod errors;
pub mod failure_queue;
pub mod indexer;
pub mod monitor;
pub mod orchestrator;
pub mod reindexer;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Dependencies, SyncConfig};
pub use errors::SyncError;
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncState};

use thiserror::Error;

/// Errors that stop the engine from starting.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
