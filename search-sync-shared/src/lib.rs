//! # Search Sync Shared
//!
//! This crate defines the data structures shared between the search sync
//! engine and its repositories: the post records read from the authoritative
//! store, the documents projected into the search index, and the reports and
//! counters produced by sync runs.

pub mod types;

pub use types::batch_result::{BatchRunResult, IndexOutcome};
pub use types::consistency::{ConsistencyReport, RebuildReason};
pub use types::post_document::{PostDocument, ProjectionError};
pub use types::post_record::{PostRecord, PostStatus};
