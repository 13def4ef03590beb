//! Redis implementation of the failure store.
//!
//! Each failed post gets its own key, `{prefix}:{post_id}`, written with
//! `SET .. EX`. Redis drops the key when the TTL runs out, so permanently
//! broken posts disappear on their own. Adding an id again resets its TTL.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::FailureStoreError;
use crate::interfaces::FailureStore;
use crate::types::FailureEntry;

/// Keys requested per `SCAN` round trip.
const SCAN_COUNT: usize = 500;

/// Redis-backed failure store.
pub struct RedisFailureStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisFailureStore {
    /// Connect to Redis and create the store.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis URL (e.g., "redis://localhost:6379")
    /// * `key_prefix` - Namespace for entry keys (e.g., "search-sync:failed")
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, FailureStoreError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        let key_prefix = key_prefix.into();

        info!(key_prefix = %key_prefix, "Connected Redis failure store");

        Ok(Self {
            connection,
            key_prefix,
        })
    }

    fn entry_key(&self, post_id: i64) -> String {
        format!("{}:{}", self.key_prefix, post_id)
    }

    /// Extract the post id from an entry key, ignoring keys of other shapes.
    fn parse_key(prefix: &str, key: &str) -> Option<i64> {
        key.strip_prefix(prefix)?.strip_prefix(':')?.parse().ok()
    }

    /// Walk the keyspace for entry keys.
    ///
    /// `SCAN` may report a key more than once, so the result is deduplicated.
    async fn scan_keys(&self) -> Result<Vec<String>, FailureStoreError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}:*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl FailureStore for RedisFailureStore {
    async fn add(&self, post_id: i64, ttl: Duration) -> Result<(), FailureStoreError> {
        let mut conn = self.connection.clone();
        let value = serde_json::to_string(&Utc::now())?;
        // Redis rejects EX 0
        let ttl_secs = ttl.as_secs().max(1);

        let _: () = redis::cmd("SET")
            .arg(self.entry_key(post_id))
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;

        debug!(post_id, ttl_secs, "Failure entry stored");
        Ok(())
    }

    async fn remove(&self, post_id: i64) -> Result<(), FailureStoreError> {
        let mut conn = self.connection.clone();

        let removed: i64 = redis::cmd("DEL")
            .arg(self.entry_key(post_id))
            .query_async(&mut conn)
            .await?;

        debug!(post_id, removed, "Failure entry removed");
        Ok(())
    }

    async fn members(&self) -> Result<Vec<i64>, FailureStoreError> {
        let keys = self.scan_keys().await?;

        Ok(keys
            .iter()
            .filter_map(|key| Self::parse_key(&self.key_prefix, key))
            .collect())
    }

    async fn entries(&self) -> Result<Vec<FailureEntry>, FailureStoreError> {
        let mut conn = self.connection.clone();
        let mut entries = Vec::new();

        for key in self.scan_keys().await? {
            let Some(post_id) = Self::parse_key(&self.key_prefix, &key) else {
                continue;
            };

            let value: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;
            let ttl_secs: i64 = redis::cmd("TTL").arg(&key).query_async(&mut conn).await?;

            // Expired between SCAN and GET
            let Some(value) = value else {
                continue;
            };
            if ttl_secs < 0 {
                continue;
            }

            let enqueued_at: DateTime<Utc> = serde_json::from_str(&value)
                .map_err(|e| FailureStoreError::CorruptEntry(format!("{}: {}", key, e)))?;

            entries.push(FailureEntry {
                post_id,
                enqueued_at,
                expires_at: Utc::now() + ChronoDuration::seconds(ttl_secs),
            });
        }

        Ok(entries)
    }
}
