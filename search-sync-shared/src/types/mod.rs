//! This module defines the core data structures used across the search sync engine.
//! It re-exports the record, document, report and run result types.

pub mod batch_result;
pub mod consistency;
pub mod post_document;
pub mod post_record;

pub use batch_result::{BatchRunResult, IndexOutcome};
pub use consistency::{ConsistencyReport, RebuildReason};
pub use post_document::{PostDocument, ProjectionError};
pub use post_record::{PostRecord, PostStatus};
