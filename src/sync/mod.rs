//! Per-screen mediation between user actions and the article store.
//!
//! Each screen owns an [`ArticleSyncFacade`] built over the one shared
//! [`ArticleStore`](crate::storage::ArticleStore). Store outcomes become
//! [`Notice`]s on a channel: transient ones for plain success, blocking ones
//! for anything the user has to acknowledge.

mod facade;
mod notice;

pub use facade::{ArticleSyncFacade, Outcome, Screen};
pub use notice::{Alert, Notice, NoticeBoard, ALREADY_SAVED, FETCHING, SAVED, WARNING};
