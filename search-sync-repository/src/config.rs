//! Backend selection for the search index.

use std::fmt;
use std::str::FromStr;

/// Which search index backend serves the engine.
///
/// Chosen once while wiring dependencies; the engine itself only sees
/// `Arc<dyn SearchIndexProvider>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBackend {
    /// Full-text index in OpenSearch.
    #[default]
    OpenSearch,
    /// Relational fallback: documents stored in a PostgreSQL table.
    Postgres,
}

impl FromStr for SearchBackend {
    type Err = String;

    /// Parse a backend name (case-insensitive).
    ///
    /// Accepts "opensearch", "elasticsearch" and "es" for OpenSearch, and
    /// "postgres", "postgresql" and "relational" for the fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "opensearch" | "elasticsearch" | "es" => Ok(Self::OpenSearch),
            "postgres" | "postgresql" | "relational" => Ok(Self::Postgres),
            other => Err(format!("unknown search backend '{}'", other)),
        }
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenSearch => f.write_str("opensearch"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}
