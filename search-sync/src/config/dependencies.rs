//! Dependency initialization and wiring for the search sync engine.

use std::env;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::orchestrator::SyncOrchestrator;
use crate::IndexingError;
use search_sync_repository::opensearch::{IndexConfig, INDEX_NAME};
use search_sync_repository::{
    FailureStore, OpenSearchProvider, PostStore, PostgresPostStore, PostgresSearchProvider,
    RedisFailureStore, SearchBackend, SearchIndexProvider,
};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Redis key prefix for failure entries.
const DEFAULT_FAILURE_KEY_PREFIX: &str = "search-sync:failed";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for the backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl ConnectionMode {
    /// Parse connection mode from a raw value.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }

    fn from_env() -> Self {
        Self::parse(env::var("CONNECTION_MODE").ok().as_deref())
    }
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL URL of the post store (required)
    /// - `SEARCH_BACKEND`: "opensearch" or "postgres" (default: opensearch)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: Index alias name (default: "posts")
    /// - `POSTS_INDEX_VERSION`: Index version number (default: 0)
    /// - `REDIS_URL`: Redis URL of the failure store (optional)
    /// - `FAILURE_KEY_PREFIX`: Redis key prefix (default: "search-sync:failed")
    /// - `CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `CONNECTION_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    ///
    /// Sync tunables are read by [`SyncConfig::from_env`].
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode,
    ///   or when `DATABASE_URL` is missing)
    pub async fn new() -> Result<Self, IndexingError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| IndexingError::config("DATABASE_URL must be set"))?;
        let backend = match env::var("SEARCH_BACKEND") {
            Ok(raw) => raw.parse::<SearchBackend>().unwrap_or_else(|e| {
                warn!(error = %e, "Invalid SEARCH_BACKEND, defaulting to opensearch");
                SearchBackend::default()
            }),
            Err(_) => SearchBackend::default(),
        };
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("CONNECTION_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let retry_interval = Duration::from_secs(retry_interval);
        let sync_config = SyncConfig::from_env();

        info!(
            backend = %backend,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval.as_secs(),
            sync_enabled = sync_config.enabled,
            auto_init_enabled = sync_config.auto_init_enabled,
            sync_threshold = sync_config.sync_threshold,
            batch_size = sync_config.batch_size,
            "Initializing dependencies"
        );

        let pool = connect_with_retry("PostgreSQL", connection_mode, retry_interval, || {
            sqlx::PgPool::connect(&database_url)
        })
        .await?;

        info!("PostgreSQL connection established");

        let store: Arc<dyn PostStore> = Arc::new(PostgresPostStore::new(pool.clone()));

        // Exits if the index cannot be prepared in fail-fast mode
        let provider: Arc<dyn SearchIndexProvider> = match backend {
            SearchBackend::OpenSearch => {
                let opensearch_url = env::var("OPENSEARCH_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
                let index_alias =
                    env::var("INDEX_ALIAS").unwrap_or_else(|_| INDEX_NAME.to_string());
                let index_version = env::var("POSTS_INDEX_VERSION")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(0);
                let index_config = IndexConfig::new(index_alias, index_version);

                let provider = connect_with_retry("OpenSearch", connection_mode, retry_interval, || {
                    Self::prepare_opensearch(&opensearch_url, index_config.clone())
                })
                .await?;

                info!(opensearch_url = %opensearch_url, "OpenSearch index ready");
                Arc::new(provider)
            }
            SearchBackend::Postgres => {
                let provider = PostgresSearchProvider::new(pool);
                connect_with_retry("relational search table", connection_mode, retry_interval, || {
                    provider.ensure_index_exists()
                })
                .await?;
                Arc::new(provider)
            }
        };

        let failure_store = Self::connect_failure_store().await;

        let orchestrator = SyncOrchestrator::new(sync_config, store, provider, failure_store);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// Create the OpenSearch provider and make sure the index and alias exist.
    async fn prepare_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let provider = OpenSearchProvider::new(url, index_config)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        provider
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;

        Ok(provider)
    }

    /// Connect the optional failure store.
    ///
    /// Failure tracking is best-effort: a missing `REDIS_URL` or an
    /// unreachable Redis only disables it.
    async fn connect_failure_store() -> Option<Arc<dyn FailureStore>> {
        let Ok(redis_url) = env::var("REDIS_URL") else {
            warn!("REDIS_URL not set, failed posts will not be tracked for retry");
            return None;
        };
        let key_prefix = env::var("FAILURE_KEY_PREFIX")
            .unwrap_or_else(|_| DEFAULT_FAILURE_KEY_PREFIX.to_string());

        match RedisFailureStore::connect(&redis_url, key_prefix).await {
            Ok(store) => {
                let store: Arc<dyn FailureStore> = Arc::new(store);
                Some(store)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect Redis, failed posts will not be tracked for retry");
                None
            }
        }
    }
}

/// Run `connect` until it succeeds, or once in fail-fast mode.
async fn connect_with_retry<T, E, F, Fut>(
    name: &str,
    mode: ConnectionMode,
    retry_interval: Duration,
    mut connect: F,
) -> Result<T, IndexingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    loop {
        match connect().await {
            Ok(value) => return Ok(value),
            Err(e) => match mode {
                ConnectionMode::FailFast => {
                    return Err(IndexingError::config(format!(
                        "Failed to connect to {}: {}",
                        name, e
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        target_name = name,
                        error = %e,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_connection_mode_parse() {
        assert_eq!(ConnectionMode::parse(None), ConnectionMode::Retry);
        assert_eq!(ConnectionMode::parse(Some("fail-fast")), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse(Some("FAIL_FAST")), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse(Some("retry")), ConnectionMode::Retry);
        assert_eq!(ConnectionMode::parse(Some("sometimes")), ConnectionMode::Retry);
    }

    #[tokio::test]
    async fn test_fail_fast_returns_first_error() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> =
            connect_with_retry("store", ConnectionMode::FailFast, Duration::ZERO, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("refused") }
            })
            .await;

        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_connected() {
        let calls = AtomicU32::new(0);

        let value = connect_with_retry("store", ConnectionMode::Retry, Duration::from_secs(15), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err("refused")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
