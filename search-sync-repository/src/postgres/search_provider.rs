//! Relational fallback for the search index.
//!
//! Deployments without OpenSearch keep projected documents in a PostgreSQL
//! table instead. The sync engine treats it like any other
//! `SearchIndexProvider`.

use async_trait::async_trait;
use search_sync_shared::PostDocument;
use tracing::{debug, info};

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS post_search_documents (
    id BIGINT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    cover_url TEXT,
    user_id BIGINT NOT NULL,
    category_id BIGINT,
    view_count BIGINT NOT NULL DEFAULT 0,
    like_count BIGINT NOT NULL DEFAULT 0,
    comment_count BIGINT NOT NULL DEFAULT 0,
    collect_count BIGINT NOT NULL DEFAULT 0,
    publish_time TIMESTAMPTZ NOT NULL,
    update_time TIMESTAMPTZ NOT NULL,
    indexed_at TIMESTAMPTZ NOT NULL
)";

const UPSERT_DOCUMENT: &str = "INSERT INTO post_search_documents (
    id, title, description, cover_url, user_id, category_id,
    view_count, like_count, comment_count, collect_count,
    publish_time, update_time, indexed_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
ON CONFLICT (id) DO UPDATE SET
    title = EXCLUDED.title,
    description = EXCLUDED.description,
    cover_url = EXCLUDED.cover_url,
    user_id = EXCLUDED.user_id,
    category_id = EXCLUDED.category_id,
    view_count = EXCLUDED.view_count,
    like_count = EXCLUDED.like_count,
    comment_count = EXCLUDED.comment_count,
    collect_count = EXCLUDED.collect_count,
    publish_time = EXCLUDED.publish_time,
    update_time = EXCLUDED.update_time,
    indexed_at = EXCLUDED.indexed_at";

/// PostgreSQL-backed search index.
pub struct PostgresSearchProvider {
    pool: sqlx::PgPool,
}

impl PostgresSearchProvider {
    /// Creates the provider over an existing pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchIndexProvider for PostgresSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        info!("Relational search table ready");
        Ok(())
    }

    async fn upsert_document(&self, document: &PostDocument) -> Result<(), SearchIndexError> {
        sqlx::query(UPSERT_DOCUMENT)
            .bind(document.id)
            .bind(&document.title)
            .bind(&document.description)
            .bind(&document.cover_url)
            .bind(document.user_id)
            .bind(document.category_id)
            .bind(document.view_count)
            .bind(document.like_count)
            .bind(document.comment_count)
            .bind(document.collect_count)
            .bind(document.publish_time)
            .bind(document.update_time)
            .bind(document.indexed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        debug!(post_id = document.id, "Document upserted");
        Ok(())
    }

    async fn delete_document(&self, post_id: i64) -> Result<(), SearchIndexError> {
        sqlx::query("DELETE FROM post_search_documents WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        debug!(post_id, "Document deleted");
        Ok(())
    }

    async fn count_documents(&self) -> Result<i64, SearchIndexError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_search_documents")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
