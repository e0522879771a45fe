use super::schema::ArticleStore;
use super::types::{Article, ArticleRow, StoreError};

impl ArticleStore {
    // ========================================================================
    // Article Mutations
    // ========================================================================

    /// Save one article inside its own transaction.
    ///
    /// Either exactly one row is added or, on any failure, none. An existing
    /// row with the same url is never overwritten.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateKey` if the url is already saved
    /// - `StoreError::Fault` for anything else, with the engine detail
    pub async fn insert(&self, article: &Article) -> Result<(), StoreError> {
        self.bounded("insert", async {
            let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

            sqlx::query(
                r#"
                INSERT INTO article (url, title, urlToImage, description, publishedAt)
                VALUES (?, ?, ?, ?, ?)
            "#,
            )
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.url_to_image)
            .bind(&article.description)
            .bind(&article.published_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_insert(e, &article.url))?;

            // Dropping an uncommitted transaction rolls it back, so every
            // early return above leaves the table untouched.
            tx.commit().await.map_err(StoreError::from_sqlx)
        })
        .await?;

        tracing::debug!(url = %article.url, "Article saved");
        Ok(())
    }

    /// Remove the article with `url`, inside its own transaction.
    ///
    /// Deleting a url that is not saved succeeds.
    /// Returns whether a row was actually removed.
    pub async fn delete(&self, url: &str) -> Result<bool, StoreError> {
        let removed = self
            .bounded("delete", async {
                let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;
                let result = sqlx::query("DELETE FROM article WHERE url = ?")
                    .bind(url)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                tx.commit().await.map_err(StoreError::from_sqlx)?;
                Ok::<_, StoreError>(result.rows_affected() > 0)
            })
            .await?;

        tracing::debug!(url = %url, removed, "Article delete");
        Ok(removed)
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Snapshot of every saved article.
    ///
    /// Rows come back in insertion order, but callers must not depend on it.
    pub async fn list(&self) -> Result<Vec<Article>, StoreError> {
        let rows = self
            .bounded("list", async {
                sqlx::query_as::<_, ArticleRow>(
                    r#"
                    SELECT url, title, urlToImage, description, publishedAt
                    FROM article
                    ORDER BY rowid
                "#,
                )
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)
            })
            .await?;

        tracing::debug!(count = rows.len(), "Listed saved articles");
        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    /// Look up a single saved article by url.
    pub async fn get(&self, url: &str) -> Result<Option<Article>, StoreError> {
        let row = self
            .bounded("get", async {
                sqlx::query_as::<_, ArticleRow>(
                    r#"
                    SELECT url, title, urlToImage, description, publishedAt
                    FROM article
                    WHERE url = ?
                "#,
                )
                .bind(url)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)
            })
            .await?;

        Ok(row.map(ArticleRow::into_article))
    }
}
