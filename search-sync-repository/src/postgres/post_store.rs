//! PostgreSQL implementation of the post store.
//!
//! Reads the `posts` table. Pages are ordered by primary key so that walking
//! increasing offsets covers every row even while new posts are inserted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use search_sync_shared::{PostRecord, PostStatus};

use crate::errors::PostStoreError;
use crate::interfaces::PostStore;

const SELECT_COLUMNS: &str = "id, title, description, cover_url, user_id, category_id, \
     view_count, like_count, comment_count, collect_count, status, publish_time, update_time";

/// Row shape of the `posts` table.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: Option<String>,
    description: Option<String>,
    cover_url: Option<String>,
    user_id: i64,
    category_id: Option<i64>,
    view_count: Option<i64>,
    like_count: Option<i64>,
    comment_count: Option<i64>,
    collect_count: Option<i64>,
    status: i16,
    publish_time: Option<DateTime<Utc>>,
    update_time: DateTime<Utc>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            title: row.title.unwrap_or_default(),
            description: row.description,
            cover_url: row.cover_url,
            user_id: row.user_id,
            category_id: row.category_id,
            view_count: row.view_count.unwrap_or(0),
            like_count: row.like_count.unwrap_or(0),
            comment_count: row.comment_count.unwrap_or(0),
            collect_count: row.collect_count.unwrap_or(0),
            status: PostStatus::from_code(row.status),
            publish_time: row.publish_time,
            update_time: row.update_time,
        }
    }
}

/// Converts a page request into `LIMIT`/`OFFSET` parameters.
fn page_bounds(offset: u64, limit: usize) -> Result<(i64, i64), PostStoreError> {
    let limit = i64::try_from(limit)
        .map_err(|_| PostStoreError::OutOfRange(format!("limit {}", limit)))?;
    let offset = i64::try_from(offset)
        .map_err(|_| PostStoreError::OutOfRange(format!("offset {}", offset)))?;
    Ok((limit, offset))
}

/// PostgreSQL-backed post store.
pub struct PostgresPostStore {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresPostStore {
    /// Creates a post store over an existing pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PostgresPostStore {
    async fn count_eligible(&self) -> Result<i64, PostStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = $1")
            .bind(PostStatus::Published.code())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Vec<PostRecord>, PostStoreError> {
        let query = format!(
            "SELECT {} FROM posts ORDER BY id ASC LIMIT $1 OFFSET $2",
            SELECT_COLUMNS
        );

        let (limit, offset) = page_bounds(offset, limit)?;

        let rows: Vec<PostRow> = sqlx::query_as(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>, PostStoreError> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", SELECT_COLUMNS);

        let row: Option<PostRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_defaults_missing_counters() {
        let now = Utc::now();
        let row = PostRow {
            id: 3,
            title: None,
            description: Some("About traits".to_string()),
            cover_url: None,
            user_id: 8,
            category_id: Some(2),
            view_count: Some(12),
            like_count: None,
            comment_count: None,
            collect_count: Some(1),
            status: 1,
            publish_time: None,
            update_time: now,
        };

        let record = PostRecord::from(row);

        assert_eq!(record.id, 3);
        assert_eq!(record.title, "");
        assert_eq!(record.status, PostStatus::Published);
        assert_eq!(record.view_count, 12);
        assert_eq!(record.like_count, 0);
        assert_eq!(record.collect_count, 1);
        assert_eq!(record.publish_time, None);
        assert_eq!(record.update_time, now);
    }

    #[test]
    fn test_unknown_status_code_is_kept() {
        let row = PostRow {
            id: 4,
            title: Some("Draft".to_string()),
            description: None,
            cover_url: None,
            user_id: 1,
            category_id: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            collect_count: None,
            status: 7,
            publish_time: None,
            update_time: Utc::now(),
        };

        let record = PostRecord::from(row);
        assert_eq!(record.status, PostStatus::Unknown(7));
        assert!(!record.is_eligible());
    }

    #[test]
    fn test_page_bounds_within_range() {
        assert_eq!(page_bounds(200, 100).unwrap(), (100, 200));
    }

    #[test]
    fn test_page_bounds_reject_offset_past_i64() {
        let err = page_bounds(u64::MAX, 10).unwrap_err();
        assert!(matches!(err, PostStoreError::OutOfRange(_)));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_page_bounds_reject_limit_past_i64() {
        let err = page_bounds(0, usize::MAX).unwrap_err();
        assert!(matches!(err, PostStoreError::OutOfRange(_)));
    }
}
