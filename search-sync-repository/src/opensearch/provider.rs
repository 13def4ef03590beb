//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsAliasParts, IndicesExistsParts, IndicesPutAliasParts},
    CountParts, DeleteParts, IndexParts, OpenSearch,
};
use search_sync_shared::PostDocument;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};

/// OpenSearch provider implementation.
///
/// All document operations go through the configured alias, so the versioned
/// index behind it can be replaced without touching the engine.
///
/// # Example
///
/// ```ignore
/// use search_sync_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let config = IndexConfig::new("posts", 0);
/// let provider = OpenSearchProvider::new("http://localhost:9200", config).await?;
/// provider.ensure_index_exists().await?;
///
/// // Writes the full document; a second call with the same post leaves one document.
/// provider.upsert_document(&document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing alias and version
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Serialize a document into the request body.
    fn document_body(document: &PostDocument) -> Result<Value, SearchIndexError> {
        serde_json::to_value(document).map_err(|e| SearchIndexError::serialization(e.to_string()))
    }

    /// Extract the document count from a `_count` response body.
    fn parse_count(body: &Value) -> Result<i64, SearchIndexError> {
        body.get("count")
            .and_then(Value::as_i64)
            .ok_or_else(|| SearchIndexError::parse(format!("Missing count in response: {}", body)))
    }

    async fn alias_exists(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists_alias(IndicesExistsAliasParts::Name(&[self.index_config.alias.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn index_exists(&self, index_name: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Ensure the versioned index exists and the alias points at it.
    ///
    /// - alias present: nothing to do
    /// - index present without alias: the alias is added
    /// - neither present: the index is created with mappings and alias
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        if self.alias_exists().await? {
            debug!(alias = %self.index_config.alias, "Index alias already exists");
            return Ok(());
        }

        let index_name = self.index_config.versioned_index_name();

        if self.index_exists(&index_name).await? {
            let response = self
                .client
                .indices()
                .put_alias(IndicesPutAliasParts::IndexName(
                    &[index_name.as_str()],
                    &self.index_config.alias,
                ))
                .send()
                .await
                .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

            let status = response.status_code();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %error_body, "Put alias request failed");
                return Err(SearchIndexError::index_creation(format!(
                    "Put alias failed with status {}: {}",
                    status, error_body
                )));
            }

            info!(index = %index_name, alias = %self.index_config.alias, "Added alias to existing index");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(get_index_settings(&self.index_config.alias))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchIndexError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index_name, alias = %self.index_config.alias, "Created search index");
        Ok(())
    }

    /// Write the full document under its id.
    ///
    /// Uses the index API rather than a partial update, so the stored document
    /// is always exactly the latest projection.
    async fn upsert_document(&self, document: &PostDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();
        let body = Self::document_body(document)?;

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, &doc_id))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Delete a document from the search index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted (or didn't exist)
    /// * `Err(SearchIndexError)` - If the deletion fails
    async fn delete_document(&self, post_id: i64) -> Result<(), SearchIndexError> {
        let doc_id = post_id.to_string();

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn count_documents(&self) -> Result<i64, SearchIndexError> {
        let response = self
            .client
            .count(CountParts::Index(&[self.index_config.alias.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::count(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Count request failed");
            return Err(SearchIndexError::count(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Self::parse_count(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_parse_count() {
        let body = json!({ "count": 1234, "_shards": { "total": 1 } });
        assert_eq!(OpenSearchProvider::parse_count(&body).unwrap(), 1234);
    }

    #[test]
    fn test_parse_count_missing_field() {
        let body = json!({ "error": "index_not_found_exception" });
        let result = OpenSearchProvider::parse_count(&body);
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[test]
    fn test_document_body_is_full_document() {
        let now = Utc::now();
        let document = PostDocument {
            id: 5,
            title: "Lifetimes".to_string(),
            description: None,
            cover_url: None,
            user_id: 9,
            category_id: Some(2),
            view_count: 1,
            like_count: 2,
            comment_count: 3,
            collect_count: 4,
            publish_time: now,
            update_time: now,
            indexed_at: now,
        };

        let body = OpenSearchProvider::document_body(&document).unwrap();

        assert_eq!(body["id"], 5);
        assert_eq!(body["title"], "Lifetimes");
        assert_eq!(body["collect_count"], 4);
        assert!(body.get("doc").is_none());
        assert!(body.get("description").is_none());
    }
}
