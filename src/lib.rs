//! Saved-article persistence for a news reader.
//!
//! - [`storage`]: the single shared `article` table behind [`storage::ArticleStore`]
//! - [`sync`]: per-screen facade turning store outcomes into user notices
//! - [`source`]: decoding remote news payloads into articles
//! - [`render`]: render-time formatting of the saved list
//! - [`share`]: link validation and mailto share links
//! - [`config`]: optional TOML configuration

pub mod config;
pub mod render;
pub mod share;
pub mod source;
pub mod storage;
pub mod sync;
