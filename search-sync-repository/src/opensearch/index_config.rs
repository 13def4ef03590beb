//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the post search index.

use serde_json::{json, Value};

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name for the search index (used for all operations).
    pub alias: String,
    /// The version number for the index (e.g., 0 for "posts_v0").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `alias` - The index alias name
    /// * `version` - The version number
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
        }
    }

    /// The concrete index the alias points at.
    pub fn versioned_index_name(&self) -> String {
        get_versioned_index_name(&self.alias, self.version)
    }
}

/// The default alias of the post search index.
pub const INDEX_NAME: &str = "posts";

/// Get the versioned index name for an alias.
///
/// # Returns
///
/// The versioned index name (e.g., "posts_v0")
pub fn get_versioned_index_name(alias: &str, version: u32) -> String {
    format!("{}_v{}", alias, version)
}

/// Get the index settings and mappings for the post search index.
///
/// The configuration includes:
/// - **search_as_you_type**: title and description, for prefix search
/// - **keyword / long**: ids and counters, for filtering and sorting
/// - **date**: publish, update and index timestamps
///
/// The alias is created together with the index so that a later version can
/// be built alongside and swapped in.
pub fn get_index_settings(alias: &str) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "aliases": {
            alias: {}
        },
        "mappings": {
            "properties": {
                "id": { "type": "long" },
                "title": {
                    "type": "search_as_you_type",
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "description": { "type": "search_as_you_type" },
                "cover_url": { "type": "keyword", "index": false },
                "user_id": { "type": "long" },
                "category_id": { "type": "long" },
                "view_count": { "type": "long" },
                "like_count": { "type": "long" },
                "comment_count": { "type": "long" },
                "collect_count": { "type": "long" },
                "publish_time": { "type": "date" },
                "update_time": { "type": "date" },
                "indexed_at": { "type": "date" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings("posts");

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["aliases"]["posts"].is_object());
        assert_eq!(
            settings["mappings"]["properties"]["title"]["type"],
            "search_as_you_type"
        );
        assert_eq!(
            settings["mappings"]["properties"]["title"]["fields"]["raw"]["type"],
            "keyword"
        );
        assert_eq!(settings["mappings"]["properties"]["like_count"]["type"], "long");
        assert_eq!(settings["mappings"]["properties"]["publish_time"]["type"], "date");
    }

    #[test]
    fn test_versioned_index_name() {
        assert_eq!(get_versioned_index_name(INDEX_NAME, 0), "posts_v0");
        assert_eq!(IndexConfig::new("posts", 3).versioned_index_name(), "posts_v3");
    }
}
