use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;

use headlines::config::Config;
use headlines::render;
use headlines::share;
use headlines::source;
use headlines::storage::{Article, ArticleStore};
use headlines::sync::{Alert, ArticleSyncFacade, Notice, NoticeBoard, Screen};

/// Get the config directory path (~/.config/headlines/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("headlines"))
}

#[derive(Parser, Debug)]
#[command(name = "headlines", about = "Keep news articles for offline reading")]
struct Args {
    /// Config file (default: ~/.config/headlines/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overrides `database_path` from the config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a single article
    Save {
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: String,
        /// Image url
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// ISO-8601 publication time (default: now)
        #[arg(long)]
        published_at: Option<String>,
    },
    /// Save every article from a news API response stored in FILE
    Import { file: PathBuf },
    /// Delete a saved article
    Delete { url: String },
    /// List saved articles
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Terminal width used for truncation
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
    /// Open a saved article in the browser
    Open { url: String },
    /// Print the email share link of a saved article
    Share {
        url: String,
        /// Hand the link to the system mail client instead of printing it
        #[arg(long)]
        open: bool,
    },
}

/// Activate a screen over the shared store. `None` if activation failed;
/// the failure has already been reported as a notice.
async fn mount(
    screen: Screen,
    store: &ArticleStore,
    notices: &mpsc::Sender<Notice>,
) -> Option<ArticleSyncFacade> {
    let mut facade = ArticleSyncFacade::new(screen, store.clone(), notices.clone());
    facade.on_mount_ensure_ready().await.then_some(facade)
}

async fn saved_article(store: &ArticleStore, url: &str) -> Result<Article> {
    store
        .get(url)
        .await
        .context("Failed to look up article")?
        .ok_or_else(|| anyhow::anyhow!("Article not saved: {}", url))
}

async fn run(
    command: Command,
    store: &ArticleStore,
    config: &Config,
    notices: mpsc::Sender<Notice>,
) -> Result<()> {
    match command {
        Command::Save {
            url,
            title,
            image,
            description,
            published_at,
        } => {
            let article = Article {
                url,
                title,
                url_to_image: image,
                description,
                published_at: published_at
                    .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            };
            if let Some(mut screen) = mount(Screen::Headlines, store, &notices).await {
                screen.save_action(&article).await;
            }
        }
        Command::Import { file } => {
            if notices.send(Notice::fetching()).await.is_err() {
                tracing::warn!("Notice receiver dropped");
            }
            let json = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let articles = source::parse_articles(&json)
                .with_context(|| format!("Failed to decode {}", file.display()))?;
            tracing::info!(count = articles.len(), "Importing articles");

            if let Some(mut screen) = mount(Screen::Search, store, &notices).await {
                for article in &articles {
                    screen.save_action(article).await;
                }
            }
        }
        Command::Delete { url } => {
            if let Some(mut screen) = mount(Screen::Saved, store, &notices).await {
                screen.delete_action(&url).await;
            }
        }
        Command::List { json, width } => {
            if let Some(mut screen) = mount(Screen::Saved, store, &notices).await {
                screen.refresh_action().await;
                if json {
                    let out = serde_json::to_string_pretty(screen.articles())
                        .context("Failed to encode articles")?;
                    println!("{}", out);
                } else {
                    print!(
                        "{}",
                        render::render_list(screen.articles(), width, &config.date_format)
                    );
                }
            }
        }
        Command::Open { url } => {
            if mount(Screen::Saved, store, &notices).await.is_some() {
                let article = saved_article(store, &url).await?;
                let link = share::validate_link(&article.url)?;
                open::that(link.as_str())
                    .with_context(|| format!("Failed to open {}", link))?;
            }
        }
        Command::Share { url, open } => {
            if mount(Screen::Saved, store, &notices).await.is_some() {
                let article = saved_article(store, &url).await?;
                let link = share::mailto_link(&article, &config.share_subject);
                if open {
                    open::that(&link).context("Failed to open mail client")?;
                } else {
                    println!("{}", link);
                }
            }
        }
    }
    Ok(())
}

/// What one notice puts on the terminal.
#[derive(Debug, Default)]
struct Shown {
    /// New status line for stdout, if the board's transient text changed
    status: Option<String>,
    /// Alerts for stderr; showing them acknowledges them
    alerts: Vec<Alert>,
}

/// Renders the state of a [`NoticeBoard`] as terminal lines.
///
/// The transient notice acts as a status line: it is printed when its text
/// changes or when the same text is posted again after it expired.
struct NoticePrinter {
    board: NoticeBoard,
    status: Option<String>,
}

impl NoticePrinter {
    fn new(board: NoticeBoard) -> Self {
        Self {
            board,
            status: None,
        }
    }

    fn post(&mut self, notice: Notice) -> Shown {
        if self.board.clear_expired() {
            self.status = None;
        }
        self.board.post(notice);

        let mut shown = Shown::default();
        if let Some(text) = self.board.transient() {
            if self.status.as_deref() != Some(text) {
                self.status = Some(text.to_string());
                shown.status = Some(text.to_string());
            }
        }
        // A terminal has no dismiss button
        while let Some(alert) = self.board.acknowledge() {
            shown.alerts.push(alert);
        }
        shown
    }
}

/// Show notices as they arrive. Returns how many alerts were shown.
async fn show_notices(mut rx: mpsc::Receiver<Notice>, board: NoticeBoard) -> usize {
    let mut printer = NoticePrinter::new(board);
    let mut alerts = 0;
    while let Some(notice) = rx.recv().await {
        let shown = printer.post(notice);
        if let Some(status) = shown.status {
            println!("{}", status);
        }
        for alert in &shown.alerts {
            eprintln!("{}: {}", alert.title, alert.message);
        }
        alerts += shown.alerts.len();
    }
    alerts
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| config_dir.join("news.db"));
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    // One store for the whole process; every screen gets a clone of the handle.
    let store = ArticleStore::open_with(db_path_str, config.store_options())
        .await
        .context("Failed to open article store")?;

    let (notice_tx, notice_rx) = mpsc::channel::<Notice>(32);
    let printer = tokio::spawn(show_notices(
        notice_rx,
        NoticeBoard::new(config.notice_duration()),
    ));

    // `run` owns the last sender, so the printer finishes once it returns.
    let result = run(args.command, &store, &config, notice_tx).await;
    let alerts = printer.await.context("Notice printer failed")?;
    store.close().await;
    result?;

    if alerts > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time;

    fn printer() -> NoticePrinter {
        NoticePrinter::new(NoticeBoard::new(Duration::from_secs(2)))
    }

    #[tokio::test]
    async fn test_status_printed_once_while_visible() {
        time::pause();
        let mut printer = printer();

        assert_eq!(printer.post(Notice::saved()).status.as_deref(), Some("Saved"));
        time::advance(Duration::from_millis(500)).await;
        assert_eq!(printer.post(Notice::saved()).status, None);
    }

    #[tokio::test]
    async fn test_status_printed_again_after_expiry() {
        time::pause();
        let mut printer = printer();

        printer.post(Notice::saved());
        time::advance(Duration::from_secs(2)).await;
        assert_eq!(printer.post(Notice::saved()).status.as_deref(), Some("Saved"));
    }

    #[tokio::test]
    async fn test_status_changes_are_printed() {
        time::pause();
        let mut printer = printer();

        printer.post(Notice::fetching());
        let shown = printer.post(Notice::saved());
        assert_eq!(shown.status.as_deref(), Some("Saved"));
        assert!(shown.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_alerts_are_shown_and_acknowledged() {
        time::pause();
        let mut printer = printer();

        printer.post(Notice::saved());
        let shown = printer.post(Notice::failed("disk I/O error"));
        assert_eq!(shown.status, None);
        assert_eq!(shown.alerts.len(), 1);
        assert_eq!(shown.alerts[0].message, "Operation failed:\ndisk I/O error");
        assert_eq!(printer.board.pending_alerts(), 0);
    }

    #[tokio::test]
    async fn test_show_notices_counts_alerts() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Notice::saved()).await.unwrap();
        tx.send(Notice::failed("a")).await.unwrap();
        tx.send(Notice::failed("b")).await.unwrap();
        drop(tx);

        let alerts = show_notices(rx, NoticeBoard::new(Duration::from_secs(2))).await;
        assert_eq!(alerts, 2);
    }
}
