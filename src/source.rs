//! Decoding of remote news payloads into [`Article`] values.
//!
//! The remote source is opaque: whatever fetched the JSON hands it here,
//! and the articles that come out are what the save action stores. Both the
//! full response envelope (`{"status": "ok", "articles": [...]}`) and a bare
//! array of articles are accepted. Extra fields (`source`, `author`,
//! `content`) are ignored.
use serde::Deserialize;
use thiserror::Error;

use crate::storage::Article;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid article payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("News source returned status '{status}': {message}")]
    Status { status: String, message: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<RawArticle>),
    Response(RawResponse),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    url: Option<String>,
    title: Option<String>,
    url_to_image: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
}

impl RawArticle {
    fn into_article(self) -> Option<Article> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        Some(Article {
            url,
            title: self.title.unwrap_or_default(),
            url_to_image: self.url_to_image,
            description: self.description,
            published_at: self.published_at.unwrap_or_default(),
        })
    }
}

/// Decode a remote payload into articles ready to save.
///
/// Articles without a url cannot be stored and are skipped.
///
/// # Errors
///
/// - `SourceError::Json` for malformed JSON
/// - `SourceError::Status` when the envelope reports a status other than `ok`
pub fn parse_articles(json: &str) -> Result<Vec<Article>, SourceError> {
    let raw = match serde_json::from_str::<Payload>(json)? {
        Payload::List(articles) => articles,
        Payload::Response(response) => {
            if let Some(status) = response.status.filter(|s| s != "ok") {
                return Err(SourceError::Status {
                    status,
                    message: response.message.unwrap_or_default(),
                });
            }
            if let Some(total) = response.total_results {
                tracing::debug!(total, received = response.articles.len(), "Decoded news response");
            }
            response.articles
        }
    };

    let received = raw.len();
    let articles: Vec<Article> = raw.into_iter().filter_map(RawArticle::into_article).collect();
    if articles.len() < received {
        tracing::warn!(
            skipped = received - articles.len(),
            "Skipped articles without a url"
        );
    }
    Ok(articles)
}
