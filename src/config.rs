//! Settings from `~/.config/headlines/config.toml`.
//!
//! Every key is optional and the file itself may be absent.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::storage::StoreOptions;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Settings file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file. Defaults to `news.db` next to the config file.
    pub database_path: Option<PathBuf>,

    /// SQLite busy_timeout in milliseconds.
    pub busy_timeout_ms: u64,

    /// Connection pool size for the file-backed store.
    pub max_connections: u32,

    /// Upper bound for a single store operation in seconds. 0 = no bound.
    pub operation_timeout_secs: u64,

    /// chrono format string used when rendering `publishedAt`.
    pub date_format: String,

    /// How long a transient notice stays visible, in seconds.
    pub notice_duration_secs: u64,

    /// Subject line of share links.
    pub share_subject: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5000,
            max_connections: 5,
            operation_timeout_secs: 10,
            date_format: "%d/%m/%Y".to_string(),
            notice_duration_secs: 2,
            share_subject: "ReadZ News".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "database_path",
        "busy_timeout_ms",
        "max_connections",
        "operation_timeout_secs",
        "date_format",
        "notice_duration_secs",
        "share_subject",
    ];

    /// Load settings from `path`, falling back to defaults.
    ///
    /// A missing or blank file gives `Config::default()`. Keys this version
    /// does not know are ignored with a warning.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed TOML or mistyped values,
    /// `ConfigError::TooLarge` past 1 MB, `ConfigError::Io` otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_source(path)? else {
            tracing::debug!(path = %path.display(), "Using default settings");
            return Ok(Self::default());
        };

        Self::warn_unknown_keys(&content);
        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            operation_timeout_secs = config.operation_timeout_secs,
            "Settings loaded"
        );
        Ok(config)
    }

    /// File contents, or `None` when there is nothing to read.
    fn read_source(path: &Path) -> Result<Option<String>, ConfigError> {
        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        if size > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} is {} bytes, limit is {}",
                path.display(),
                size,
                Self::MAX_FILE_SIZE
            )));
        }

        // The file can vanish between the size check and the read
        match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    fn warn_unknown_keys(content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else {
            return;
        };
        for key in table.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "Ignoring unrecognized setting");
        }
    }

    /// Store connection settings derived from this config.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            max_connections: self.max_connections,
            operation_timeout: match self.operation_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_duration_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
