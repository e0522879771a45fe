use std::borrow::Cow;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Transient text shown after a successful save
pub const SAVED: &str = "Saved";
/// Transient text shown while remote articles load
pub const FETCHING: &str = "Fetching...";
/// Blocking text for a save whose url is already stored
pub const ALREADY_SAVED: &str = "Article already saved!";
/// Title of every blocking notice
pub const WARNING: &str = "Warning";

/// A notice that stays up until the user acknowledges it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: Cow<'static, str>,
    pub message: String,
}

/// User-facing feedback produced by the sync facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Non-blocking, dismisses itself
    Transient(Cow<'static, str>),
    /// Must be acknowledged
    Blocking(Alert),
}

impl Notice {
    pub fn saved() -> Self {
        Notice::Transient(Cow::Borrowed(SAVED))
    }

    pub fn fetching() -> Self {
        Notice::Transient(Cow::Borrowed(FETCHING))
    }

    pub fn already_saved() -> Self {
        Notice::Blocking(Alert {
            title: Cow::Borrowed(WARNING),
            message: ALREADY_SAVED.to_string(),
        })
    }

    /// Blocking notice carrying the failure detail.
    pub fn failed(detail: &str) -> Self {
        Notice::Blocking(Alert {
            title: Cow::Borrowed(WARNING),
            message: format!("Operation failed:\n{detail}"),
        })
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Notice::Blocking(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Transient(text) => text,
            Notice::Blocking(alert) => &alert.message,
        }
    }
}

// ============================================================================
// Notice Board
// ============================================================================

/// Holds what the user currently sees: at most one transient notice, which
/// expires on its own, and a queue of alerts waiting for acknowledgment.
#[derive(Debug)]
pub struct NoticeBoard {
    transient: Option<(Cow<'static, str>, Instant)>,
    alerts: VecDeque<Alert>,
    lifetime: Duration,
}

impl NoticeBoard {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            transient: None,
            alerts: VecDeque::new(),
            lifetime,
        }
    }

    /// Show a notice. A new transient notice replaces the previous one.
    pub fn post(&mut self, notice: Notice) {
        match notice {
            Notice::Transient(text) => self.transient = Some((text, Instant::now())),
            Notice::Blocking(alert) => self.alerts.push_back(alert),
        }
    }

    pub fn transient(&self) -> Option<&str> {
        self.transient.as_ref().map(|(text, _)| text.as_ref())
    }

    /// Clear the transient notice if its lifetime has passed.
    /// Returns true if a notice was actually cleared.
    pub fn clear_expired(&mut self) -> bool {
        if let Some((_, shown_at)) = &self.transient {
            if shown_at.elapsed() >= self.lifetime {
                self.transient = None;
                return true;
            }
        }
        false
    }

    /// The alert currently on screen, if any.
    pub fn current_alert(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    /// Dismiss the current alert and return it.
    pub fn acknowledge(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    pub fn pending_alerts(&self) -> usize {
        self.alerts.len()
    }
}
