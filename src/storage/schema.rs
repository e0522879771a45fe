use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use super::types::StoreError;

/// In-memory database path accepted by [`ArticleStore::open`]
pub const IN_MEMORY: &str = ":memory:";

const CREATE_ARTICLE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS article (
        url TEXT PRIMARY KEY,
        title TEXT,
        urlToImage TEXT,
        description TEXT,
        publishedAt TEXT
    )
"#;

// ============================================================================
// Options
// ============================================================================

/// Connection settings for [`ArticleStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long SQLite waits on a locked database before returning SQLITE_BUSY
    pub busy_timeout: Duration,
    /// Pool size for file-backed stores. In-memory stores always use one.
    pub max_connections: u32,
    /// Upper bound for any single store operation. `None` waits forever.
    pub operation_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            max_connections: 5,
            operation_timeout: Some(Duration::from_secs(10)),
        }
    }
}

// ============================================================================
// ArticleStore
// ============================================================================

/// Process-wide handle to the saved-article table.
///
/// Cloning is cheap and every clone shares the same connection pool, so one
/// store is opened at startup and handed to each screen.
#[derive(Clone)]
pub struct ArticleStore {
    pub(crate) pool: SqlitePool,
    operation_timeout: Option<Duration>,
}

impl ArticleStore {
    /// Open a store with default options.
    ///
    /// Opening does not create the table; call [`ArticleStore::ensure_schema`].
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        Self::open_with(path, StoreOptions::default()).await
    }

    /// Open a store at `path` (or [`IN_MEMORY`]).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Fault` if the database cannot be opened.
    pub async fn open_with(path: &str, options: StoreOptions) -> Result<Self, StoreError> {
        let in_memory = path == IN_MEMORY;

        // Pre-create the file user-only so there is no window with umask permissions
        #[cfg(unix)]
        if !in_memory {
            let db_path = std::path::Path::new(path);
            if !db_path.exists() {
                use std::os::unix::fs::OpenOptionsExt;
                // If creation fails, SQLite reports the error at connect_with.
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok();
            }
        }

        let base = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::from_sqlx)?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };
        let connect = base.pragma("busy_timeout", options.busy_timeout.as_millis().to_string());

        // Each connection to :memory: is its own database, so the pool must
        // hold exactly one connection and never recycle it.
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(options.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(connect)
            .await
            .map_err(StoreError::from_sqlx)?;

        tracing::info!(path = %path, "Article store opened");
        Ok(Self {
            pool,
            operation_timeout: options.operation_timeout,
        })
    }

    /// Create the article table if it does not exist.
    ///
    /// Safe to call any number of times from any number of screens, including
    /// concurrently: `CREATE TABLE IF NOT EXISTS` is a no-op once the table
    /// is there, and SQLite serializes the racing writers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Schema` with the engine detail, or
    /// `StoreError::Fault` if the operation timed out.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.bounded("ensure_schema", async {
            let mut tx = self.pool.begin().await.map_err(StoreError::schema)?;
            sqlx::query(CREATE_ARTICLE_TABLE)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::schema)?;
            tx.commit().await.map_err(StoreError::schema)
        })
        .await?;

        tracing::debug!("Article schema ensured");
        Ok(())
    }

    /// Close every pooled connection. Later operations fail with `Fault`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run `fut` under the configured operation timeout.
    ///
    /// A timeout surfaces as `StoreError::Fault`; no caller relies on a
    /// separate timeout kind.
    pub(crate) async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let Some(limit) = self.operation_timeout else {
            return fut.await;
        };

        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    op = op,
                    timeout_ms = limit.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(StoreError::Fault(format!(
                    "{op} timed out after {}ms",
                    limit.as_millis()
                )))
            }
        }
    }
}
