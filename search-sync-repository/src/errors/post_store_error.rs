//! Error types for the authoritative post store.

use thiserror::Error;

/// Represents errors that can occur while reading from the post store.
///
/// Any of these means the store could not answer; the engine treats them as
/// "store unavailable" and never as an empty result.
#[derive(Debug, Error)]
pub enum PostStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A page bound does not fit the database's integer type.
    #[error("Page bound out of range: {0}")]
    OutOfRange(String),
}
