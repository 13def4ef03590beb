//! In-memory gateways shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use search_sync_repository::{
    FailureEntry, FailureStore, FailureStoreError, PostStore, PostStoreError, SearchIndexError,
    SearchIndexProvider,
};
use search_sync_shared::{PostDocument, PostRecord, PostStatus};

pub fn published_post(id: i64) -> PostRecord {
    PostRecord {
        id,
        title: format!("Post {}", id),
        description: Some("body".to_string()),
        cover_url: None,
        user_id: 1,
        category_id: Some(3),
        view_count: id,
        like_count: 0,
        comment_count: 0,
        collect_count: 0,
        status: PostStatus::Published,
        publish_time: Some(Utc::now()),
        update_time: Utc::now(),
    }
}

pub fn draft_post(id: i64) -> PostRecord {
    PostRecord {
        status: PostStatus::Draft,
        publish_time: None,
        ..published_post(id)
    }
}

/// Search index backed by a map, with scripted upsert failures.
#[derive(Default)]
pub struct MockSearchProvider {
    documents: Mutex<BTreeMap<i64, PostDocument>>,
    /// Remaining failures per post id; `None` fails forever.
    failures: Mutex<HashMap<i64, Option<u32>>>,
    upserts: AtomicUsize,
    deletes: AtomicUsize,
    count_fails: bool,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose count call is unreachable.
    pub fn unreachable() -> Self {
        Self {
            count_fails: true,
            ..Self::default()
        }
    }

    pub fn with_documents(ids: impl IntoIterator<Item = i64>) -> Self {
        let provider = Self::new();
        {
            let mut documents = provider.documents.lock().unwrap();
            for id in ids {
                let document = PostDocument::from_record(&published_post(id)).unwrap();
                documents.insert(id, document);
            }
        }
        provider
    }

    pub fn fail_next(&self, post_id: i64, times: u32) {
        self.failures.lock().unwrap().insert(post_id, Some(times));
    }

    pub fn fail_always(&self, post_id: i64) {
        self.failures.lock().unwrap().insert(post_id, None);
    }

    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn document_ids(&self) -> Vec<i64> {
        self.documents.lock().unwrap().keys().copied().collect()
    }
}

#[async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn upsert_document(&self, document: &PostDocument) -> Result<(), SearchIndexError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);

        {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&document.id) {
                Some(None) => return Err(SearchIndexError::index("connection reset")),
                Some(Some(remaining)) if *remaining > 0 => {
                    *remaining -= 1;
                    return Err(SearchIndexError::index("timeout"));
                }
                _ => {}
            }
        }

        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn delete_document(&self, post_id: i64) -> Result<(), SearchIndexError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.documents.lock().unwrap().remove(&post_id);
        Ok(())
    }

    async fn count_documents(&self) -> Result<i64, SearchIndexError> {
        if self.count_fails {
            return Err(SearchIndexError::connection("connection refused"));
        }
        Ok(self.documents.lock().unwrap().len() as i64)
    }
}

/// Post store over a vector ordered by id.
#[derive(Default)]
pub struct MockPostStore {
    records: Mutex<Vec<PostRecord>>,
    /// Page fetches at or beyond this offset fail.
    fail_from_offset: Option<u64>,
    fail_all: bool,
    page_fetches: AtomicUsize,
}

impl MockPostStore {
    pub fn new(mut records: Vec<PostRecord>) -> Self {
        records.sort_by_key(|record| record.id);
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn published(count: i64) -> Self {
        Self::new((1..=count).map(published_post).collect())
    }

    pub fn unreachable() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_from(mut self, offset: u64) -> Self {
        self.fail_from_offset = Some(offset);
        self
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, post_id: i64, status: PostStatus) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|record| record.id == post_id) {
            record.status = status;
        }
    }

    fn unavailable() -> PostStoreError {
        PostStoreError::DatabaseError(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl PostStore for MockPostStore {
    async fn count_eligible(&self) -> Result<i64, PostStoreError> {
        if self.fail_all {
            return Err(Self::unavailable());
        }
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|record| record.is_eligible()).count() as i64)
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Vec<PostRecord>, PostStoreError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.fail_from_offset.is_some_and(|from| offset >= from) {
            return Err(Self::unavailable());
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>, PostStoreError> {
        if self.fail_all {
            return Err(Self::unavailable());
        }
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|record| record.id == id).cloned())
    }
}

/// Failure store whose every call fails.
pub struct FlakyFailureStore;

#[async_trait]
impl FailureStore for FlakyFailureStore {
    async fn add(&self, _post_id: i64, _ttl: Duration) -> Result<(), FailureStoreError> {
        Err(FailureStoreError::CorruptEntry("store offline".to_string()))
    }

    async fn remove(&self, _post_id: i64) -> Result<(), FailureStoreError> {
        Err(FailureStoreError::CorruptEntry("store offline".to_string()))
    }

    async fn members(&self) -> Result<Vec<i64>, FailureStoreError> {
        Err(FailureStoreError::CorruptEntry("store offline".to_string()))
    }

    async fn entries(&self) -> Result<Vec<FailureEntry>, FailureStoreError> {
        Err(FailureStoreError::CorruptEntry("store offline".to_string()))
    }
}
