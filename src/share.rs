use thiserror::Error;
use url::Url;

use crate::storage::Article;

/// Errors for links handed to the system opener.
#[derive(Error, Debug)]
pub enum ShareError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Check that a stored article link is safe to open in a browser.
///
/// Only `http` and `https` are allowed, so a saved `file://` or
/// `javascript:` url from a remote source never reaches the system opener.
///
/// # Examples
///
/// ```
/// use headlines::share::validate_link;
///
/// assert!(validate_link("https://example.com/story").is_ok());
/// assert!(validate_link("file:///etc/passwd").is_err());
/// ```
pub fn validate_link(link: &str) -> Result<Url, ShareError> {
    let url = Url::parse(link)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ShareError::UnsupportedScheme(scheme.to_owned())),
    }
}

/// Build a `mailto:` link that shares an article by email.
///
/// The body is the title, description and url separated by `-` lines.
pub fn mailto_link(article: &Article, subject: &str) -> String {
    let body = format!(
        "{}\n-\n{}\n-\n{}",
        article.title,
        article.description.as_deref().unwrap_or_default(),
        article.url
    );
    format!(
        "mailto:?subject={}&body={}",
        percent_encode(subject),
        percent_encode(&body)
    )
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
