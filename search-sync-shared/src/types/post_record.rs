//! Post records as read from the authoritative store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of a post.
///
/// Stored as a small integer in the authoritative store. Only
/// [`PostStatus::Published`] posts are eligible for the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Draft,
    Published,
    Deleted,
    /// A status code this engine does not know about. Never eligible.
    Unknown(i16),
}

impl PostStatus {
    /// Convert a stored status code into a status.
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => Self::Draft,
            1 => Self::Published,
            2 => Self::Deleted,
            other => Self::Unknown(other),
        }
    }

    /// The status code as stored in the authoritative store.
    pub fn code(&self) -> i16 {
        match self {
            Self::Draft => 0,
            Self::Published => 1,
            Self::Deleted => 2,
            Self::Unknown(code) => *code,
        }
    }
}

/// A content record owned by the authoritative store.
///
/// The sync engine only reads these; it never writes back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub collect_count: i64,
    pub status: PostStatus,
    pub publish_time: Option<DateTime<Utc>>,
    pub update_time: DateTime<Utc>,
}

impl PostRecord {
    /// Whether this record currently qualifies for the search index.
    pub fn is_eligible(&self) -> bool {
        self.status == PostStatus::Published
    }
}
