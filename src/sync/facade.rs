use std::fmt;
use tokio::sync::mpsc;

use super::notice::Notice;
use crate::storage::{Article, ArticleStore, StoreError};

// ============================================================================
// Screens
// ============================================================================

/// The screens that touch saved articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Top headlines, can save
    Headlines,
    /// Search results by topic, can save
    Search,
    /// Saved articles, can delete and refresh
    Saved,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Headlines => "headlines",
            Screen::Search => "search",
            Screen::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// Result of a facade action, mirroring the notice that was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    AlreadySaved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Readiness {
    /// Not activated yet
    Inactive,
    Ready,
    /// Schema setup failed during the last activation
    Failed(String),
}

// ============================================================================
// ArticleSyncFacade
// ============================================================================

/// Per-screen mediator between user actions and the shared [`ArticleStore`].
///
/// Every action takes `&mut self`, so a screen has at most one operation in
/// flight. The schema is guaranteed to be in place before any insert, delete
/// or list issued through this facade: an action on an inactive screen
/// activates it first, and an action after a failed activation is refused
/// until the screen is activated again.
pub struct ArticleSyncFacade {
    screen: Screen,
    store: ArticleStore,
    notices: mpsc::Sender<Notice>,
    readiness: Readiness,
    articles: Vec<Article>,
}

impl ArticleSyncFacade {
    pub fn new(screen: Screen, store: ArticleStore, notices: mpsc::Sender<Notice>) -> Self {
        Self {
            screen,
            store,
            notices,
            readiness: Readiness::Inactive,
            articles: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The view model the screen renders, as of the last successful refresh.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Screen activation: make sure the article table exists.
    ///
    /// Runs on every activation, so a failed activation is retried by the
    /// next one. Failure is reported through a blocking notice.
    pub async fn on_mount_ensure_ready(&mut self) -> bool {
        match self.store.ensure_schema().await {
            Ok(()) => {
                tracing::debug!(screen = %self.screen, "Screen ready");
                self.readiness = Readiness::Ready;
                true
            }
            Err(e) => {
                tracing::warn!(screen = %self.screen, error = %e, "Schema setup failed");
                let detail = e.detail().to_owned();
                self.emit(Notice::failed(&detail)).await;
                self.readiness = Readiness::Failed(detail);
                false
            }
        }
    }

    /// Save a fetched article.
    ///
    /// - saved → transient "Saved"
    /// - already stored → blocking "Article already saved!"
    /// - any other failure → blocking message with the detail
    pub async fn save_action(&mut self, article: &Article) -> Outcome {
        if !self.ensure_ready().await {
            return Outcome::Failed;
        }

        match self.store.insert(article).await {
            Ok(()) => {
                self.emit(Notice::saved()).await;
                Outcome::Completed
            }
            Err(StoreError::DuplicateKey { url }) => {
                tracing::debug!(screen = %self.screen, url = %url, "Article already saved");
                self.emit(Notice::already_saved()).await;
                Outcome::AlreadySaved
            }
            Err(e) => self.fail("save", &e).await,
        }
    }

    /// Delete a saved article, then refresh the list.
    ///
    /// Success is silent apart from the refreshed view model.
    pub async fn delete_action(&mut self, url: &str) -> Outcome {
        if !self.ensure_ready().await {
            return Outcome::Failed;
        }

        match self.store.delete(url).await {
            Ok(_) => self.refresh_action().await,
            Err(e) => self.fail("delete", &e).await,
        }
    }

    /// Replace the view model with the current saved articles.
    ///
    /// Never retries on its own. On failure the previous view model stays in
    /// place and a blocking notice is emitted; the caller decides whether to
    /// try again.
    pub async fn refresh_action(&mut self) -> Outcome {
        if !self.ensure_ready().await {
            return Outcome::Failed;
        }

        match self.store.list().await {
            Ok(articles) => {
                self.articles = articles;
                Outcome::Completed
            }
            Err(e) => self.fail("refresh", &e).await,
        }
    }

    /// Gate for every store operation.
    async fn ensure_ready(&mut self) -> bool {
        match &self.readiness {
            Readiness::Ready => true,
            Readiness::Inactive => self.on_mount_ensure_ready().await,
            Readiness::Failed(detail) => {
                let notice = Notice::failed(detail);
                self.emit(notice).await;
                false
            }
        }
    }

    async fn fail(&self, action: &'static str, err: &StoreError) -> Outcome {
        tracing::warn!(screen = %self.screen, action, error = %err, "Store operation failed");
        self.emit(Notice::failed(err.detail())).await;
        Outcome::Failed
    }

    async fn emit(&self, notice: Notice) {
        if self.notices.send(notice).await.is_err() {
            tracing::warn!(screen = %self.screen, "Notice receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::IN_MEMORY;
    use crate::sync::notice::{ALREADY_SAVED, SAVED};

    async fn test_facade(screen: Screen) -> (ArticleSyncFacade, mpsc::Receiver<Notice>) {
        let store = ArticleStore::open(IN_MEMORY).await.unwrap();
        let (tx, rx) = mpsc::channel(32);
        (ArticleSyncFacade::new(screen, store, tx), rx)
    }

    fn test_article(url: &str) -> Article {
        Article {
            url: url.to_string(),
            title: "T".to_string(),
            url_to_image: Some(String::new()),
            description: Some("D".to_string()),
            published_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn drain(rx: &mut mpsc::Receiver<Notice>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(n) = rx.try_recv() {
            notices.push(n);
        }
        notices
    }

    #[tokio::test]
    async fn test_mount_marks_ready_without_notice() {
        let (mut facade, mut rx) = test_facade(Screen::Saved).await;
        assert!(!facade.is_ready());
        assert!(facade.on_mount_ensure_ready().await);
        assert!(facade.is_ready());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_save_emits_saved() {
        let (mut facade, mut rx) = test_facade(Screen::Headlines).await;
        facade.on_mount_ensure_ready().await;

        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::Completed);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(!notices[0].is_blocking());
        assert_eq!(notices[0].text(), SAVED);
    }

    #[tokio::test]
    async fn test_save_duplicate_emits_already_saved() {
        let (mut facade, mut rx) = test_facade(Screen::Search).await;
        facade.on_mount_ensure_ready().await;
        facade.save_action(&test_article("https://x/1")).await;
        drain(&mut rx);

        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::AlreadySaved);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_blocking());
        assert_eq!(notices[0].text(), ALREADY_SAVED);
    }

    #[tokio::test]
    async fn test_action_before_mount_activates_first() {
        let (mut facade, mut rx) = test_facade(Screen::Headlines).await;

        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::Completed);
        assert!(facade.is_ready());
        assert_eq!(drain(&mut rx), vec![Notice::saved()]);
    }

    #[tokio::test]
    async fn test_delete_refreshes_view_model() {
        let (mut facade, mut rx) = test_facade(Screen::Saved).await;
        facade.on_mount_ensure_ready().await;
        facade.save_action(&test_article("https://x/1")).await;
        facade.save_action(&test_article("https://x/2")).await;
        facade.refresh_action().await;
        assert_eq!(facade.articles().len(), 2);
        drain(&mut rx);

        let outcome = facade.delete_action("https://x/2").await;
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(facade.articles().len(), 1);
        assert_eq!(facade.articles()[0].url, "https://x/1");
        // Delete success is silent
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_silent_success() {
        let (mut facade, mut rx) = test_facade(Screen::Saved).await;
        let outcome = facade.delete_action("https://x/does-not-exist").await;
        assert_eq!(outcome, Outcome::Completed);
        assert!(facade.articles().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_mount_blocks_actions_until_next_mount() {
        let (mut facade, mut rx) = test_facade(Screen::Saved).await;
        facade.store.close().await;

        assert!(!facade.on_mount_ensure_ready().await);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text().starts_with("Operation failed:\n"));

        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::Failed);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_blocking());
        assert!(!facade.is_ready());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_view_model() {
        let (mut facade, mut rx) = test_facade(Screen::Saved).await;
        facade.save_action(&test_article("https://x/1")).await;
        facade.refresh_action().await;
        assert_eq!(facade.articles().len(), 1);
        drain(&mut rx);

        facade.store.close().await;
        let outcome = facade.refresh_action().await;
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(facade.articles().len(), 1);

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_blocking());
        assert!(notices[0].text().starts_with("Operation failed:\n"));
    }

    #[tokio::test]
    async fn test_save_fault_reports_detail() {
        let (mut facade, mut rx) = test_facade(Screen::Headlines).await;
        facade.on_mount_ensure_ready().await;
        sqlx::query("DROP TABLE article")
            .execute(&facade.store.pool)
            .await
            .unwrap();

        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::Failed);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text().contains("no such table"));
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_fail_action() {
        let (mut facade, rx) = test_facade(Screen::Headlines).await;
        drop(rx);
        let outcome = facade.save_action(&test_article("https://x/1")).await;
        assert_eq!(outcome, Outcome::Completed);
    }
}
