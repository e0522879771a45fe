use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Store failures, classified so callers can pick a presentation.
///
/// `DuplicateKey` is an expected outcome of saving an article twice and is
/// kept apart from every other failure. Both fault variants carry the
/// engine's diagnostic text.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An article with this url is already saved
    #[error("Article already saved: {url}")]
    DuplicateKey { url: String },

    /// Any other persistence failure (I/O, corruption, timeout, closed pool)
    #[error("Store operation failed: {0}")]
    Fault(String),

    /// The article table could not be created
    #[error("Schema setup failed: {0}")]
    Schema(String),
}

impl StoreError {
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        StoreError::Fault(err.to_string())
    }

    pub(crate) fn schema(err: sqlx::Error) -> Self {
        StoreError::Schema(err.to_string())
    }

    /// Classify an insert failure.
    ///
    /// The engine tags unique and primary-key violations with a structured
    /// error kind, so the duplicate check never looks at message text.
    pub(crate) fn from_insert(err: sqlx::Error, url: &str) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateKey {
                    url: url.to_owned(),
                }
            }
            other => StoreError::from_sqlx(other),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }

    /// Diagnostic text without the variant prefix, for user-facing notices.
    pub fn detail(&self) -> &str {
        match self {
            StoreError::DuplicateKey { url } => url,
            StoreError::Fault(detail) | StoreError::Schema(detail) => detail,
        }
    }
}

// ============================================================================
// Helper Types
// ============================================================================

/// Internal row type for article queries (used by sqlx FromRow)
///
/// Column names follow the on-disk layout of existing `news.db` files.
/// Every column except `url` is nullable there, so legacy rows with a NULL
/// title or timestamp decode to an empty string instead of failing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleRow {
    pub url: String,
    pub title: Option<String>,
    #[sqlx(rename = "urlToImage")]
    pub url_to_image: Option<String>,
    pub description: Option<String>,
    #[sqlx(rename = "publishedAt")]
    pub published_at: Option<String>,
}

impl ArticleRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            url: self.url,
            title: self.title.unwrap_or_default(),
            url_to_image: self.url_to_image,
            description: self.description,
            published_at: self.published_at.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A saved news item, identified by its source url.
///
/// Serialized with the camelCase field names the remote news source uses,
/// so a decoded remote article can be saved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 timestamp exactly as the source supplied it
    #[serde(default)]
    pub published_at: String,
}
