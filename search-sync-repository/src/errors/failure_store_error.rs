//! Error types for the durable TTL set behind the failure queue.

use thiserror::Error;

/// Represents errors that can occur in a failure store backend.
#[derive(Debug, Error)]
pub enum FailureStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored key or value did not have the expected shape.
    #[error("Corrupt entry: {0}")]
    CorruptEntry(String),
}
