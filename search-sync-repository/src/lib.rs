//! # Search Sync Repository
//!
//! This crate provides the gateway traits the sync engine talks through and
//! their concrete implementations:
//!
//! - [`PostStore`]: the authoritative post store ([`PostgresPostStore`])
//! - [`SearchIndexProvider`]: the search index, either [`OpenSearchProvider`]
//!   or the relational fallback [`PostgresSearchProvider`]
//! - [`FailureStore`]: the durable TTL set behind the failure queue
//!   ([`RedisFailureStore`], [`InMemoryFailureStore`])

pub mod config;
pub mod errors;
pub mod failure_store;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use config::SearchBackend;
pub use errors::{FailureStoreError, PostStoreError, SearchIndexError};
pub use failure_store::{InMemoryFailureStore, RedisFailureStore};
pub use interfaces::{FailureStore, PostStore, SearchIndexProvider};
pub use self::opensearch::OpenSearchProvider;
pub use postgres::{PostgresPostStore, PostgresSearchProvider};
pub use types::FailureEntry;
