//! Post document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine
//! and the projection from an authoritative [`PostRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::post_record::PostRecord;

/// Errors raised when a record cannot be projected into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The record has an empty or whitespace-only title.
    #[error("Post {0} has a blank title")]
    BlankTitle(i64),

    /// A published record without a publish time.
    #[error("Post {0} is published but has no publish time")]
    MissingPublishTime(i64),
}

/// Document representation for the search index.
///
/// One document exists per eligible post, keyed by the post id. Every
/// (re)index writes the full document, so the stored state never depends on
/// what was there before.
///
/// # Fields
///
/// - `id`: Post identifier, also the document id
/// - `title`: Post title (primary search field)
/// - `description`: Optional summary text (secondary search field)
/// - `cover_url`: Optional cover image URL
/// - `user_id`, `category_id`: Filter fields
/// - `view_count`, `like_count`, `comment_count`, `collect_count`: Counters
/// - `publish_time`, `update_time`: Timestamps from the store
/// - `indexed_at`: Timestamp when the document was projected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostDocument {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub collect_count: i64,
    pub publish_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub indexed_at: DateTime<Utc>,
}

impl PostDocument {
    /// Project a post record into its search document.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] when the record is missing data the index
    /// requires (blank title, no publish time).
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use search_sync_shared::{PostDocument, PostRecord, PostStatus};
    ///
    /// let record = PostRecord {
    ///     id: 42,
    ///     title: "Rust ownership".to_string(),
    ///     description: None,
    ///     cover_url: None,
    ///     user_id: 1,
    ///     category_id: None,
    ///     view_count: 10,
    ///     like_count: 2,
    ///     comment_count: 0,
    ///     collect_count: 1,
    ///     status: PostStatus::Published,
    ///     publish_time: Some(Utc::now()),
    ///     update_time: Utc::now(),
    /// };
    ///
    /// let doc = PostDocument::from_record(&record).expect("projectable record");
    /// assert_eq!(doc.document_id(), "42");
    /// ```
    pub fn from_record(record: &PostRecord) -> Result<Self, ProjectionError> {
        let title = record.title.trim();
        if title.is_empty() {
            return Err(ProjectionError::BlankTitle(record.id));
        }
        let publish_time = record
            .publish_time
            .ok_or(ProjectionError::MissingPublishTime(record.id))?;

        Ok(Self {
            id: record.id,
            title: title.to_string(),
            description: record.description.clone(),
            cover_url: record.cover_url.clone(),
            user_id: record.user_id,
            category_id: record.category_id,
            view_count: record.view_count,
            like_count: record.like_count,
            comment_count: record.comment_count,
            collect_count: record.collect_count,
            publish_time,
            update_time: record.update_time,
            indexed_at: Utc::now(),
        })
    }

    /// Generate the document ID used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}
