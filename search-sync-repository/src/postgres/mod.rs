//! PostgreSQL implementations.
//!
//! - [`PostgresPostStore`] reads the authoritative `posts` table.
//! - [`PostgresSearchProvider`] is the relational search index fallback,
//!   storing projected documents in `post_search_documents`.

mod post_store;
mod search_provider;

pub use post_store::PostgresPostStore;
pub use search_provider::PostgresSearchProvider;
